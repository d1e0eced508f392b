//! Stability presets for downstream processing flags.
//!
//! Generation pipelines take a handful of tuning flags whose safe
//! combinations are easier to name than to remember. A
//! [`StabilityProfile`] is such a name; resolving one yields a
//! [`ProcessingFlags`] overlay that can be merged over caller-supplied
//! values. Pure mapping, no I/O, and nothing in the media core consults it.

use serde::{Deserialize, Serialize};

/// Named preset profiles, ordered from most to least conservative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StabilityProfile {
    /// Prioritise output stability over speed.
    Stable,
    /// The default trade-off.
    Balanced,
    /// Prioritise speed; acceptable quality loss.
    Fast,
}

impl StabilityProfile {
    /// Resolve a profile id string.
    ///
    /// Returns `None` for unknown ids — unknown profiles are the caller's
    /// problem to surface, not silently defaulted.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "stable" => Some(Self::Stable),
            "balanced" => Some(Self::Balanced),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }

    /// The flag overlay this profile stands for.
    pub fn flags(&self) -> ProcessingFlags {
        match self {
            Self::Stable => ProcessingFlags {
                skip_layer_guidance: false,
                cache_threshold: 0.0,
                tiled_decode: false,
            },
            Self::Balanced => ProcessingFlags {
                skip_layer_guidance: true,
                cache_threshold: 0.15,
                tiled_decode: false,
            },
            Self::Fast => ProcessingFlags {
                skip_layer_guidance: true,
                cache_threshold: 0.3,
                tiled_decode: true,
            },
        }
    }
}

/// Tuning flags consumed by the downstream processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingFlags {
    /// Skip guidance on selected layers to trade quality for speed.
    pub skip_layer_guidance: bool,
    /// Relative change threshold below which cached activations are reused
    /// (0 disables caching).
    pub cache_threshold: f64,
    /// Decode output in tiles to bound memory use.
    pub tiled_decode: bool,
}

impl Default for ProcessingFlags {
    fn default() -> Self {
        StabilityProfile::Balanced.flags()
    }
}

impl ProcessingFlags {
    /// Merge explicit overrides over this overlay.
    ///
    /// `None` fields keep the preset's value.
    pub fn with_overrides(
        mut self,
        skip_layer_guidance: Option<bool>,
        cache_threshold: Option<f64>,
        tiled_decode: Option<bool>,
    ) -> Self {
        if let Some(value) = skip_layer_guidance {
            self.skip_layer_guidance = value;
        }
        if let Some(value) = cache_threshold {
            self.cache_threshold = value;
        }
        if let Some(value) = tiled_decode {
            self.tiled_decode = value;
        }
        self
    }
}
