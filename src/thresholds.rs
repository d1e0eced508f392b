//! Validation thresholds.
//!
//! [`Thresholds`] carries the caller-supplied limits that
//! [`evaluate`](crate::validator::evaluate) checks resolved metadata against,
//! plus the load timeout used by the readiness race. All fields have
//! conventional defaults; a default-constructed value matches the stock
//! validation behaviour.
//!
//! # Example
//!
//! ```
//! use clipcheck::Thresholds;
//!
//! let thresholds = Thresholds::new()
//!     .with_min_duration(1.0)
//!     .with_min_resolution(640, 360);
//! assert_eq!(thresholds.min_width, 640);
//! ```

use serde::{Deserialize, Serialize};

/// Duration and resolution limits for clip validation.
///
/// `max_duration` is a soft ceiling — exceeding it produces a warning, not a
/// validation error. All other limits are hard. `load_timeout_ms` bounds how
/// long the readiness race waits for a terminal signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[must_use]
pub struct Thresholds {
    /// Minimum acceptable duration in seconds (hard).
    pub min_duration: f64,
    /// Maximum recommended duration in seconds (soft — warning only).
    pub max_duration: f64,
    /// Minimum acceptable frame width in pixels.
    pub min_width: u32,
    /// Minimum acceptable frame height in pixels.
    pub min_height: u32,
    /// How long to wait for the resource to become ready, in milliseconds.
    pub load_timeout_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_duration: 0.5,
            max_duration: 30.0,
            min_width: 320,
            min_height: 180,
            load_timeout_ms: 10_000,
        }
    }
}

impl Thresholds {
    /// Create thresholds with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum acceptable duration in seconds.
    pub fn with_min_duration(mut self, seconds: f64) -> Self {
        self.min_duration = seconds;
        self
    }

    /// Set the maximum recommended duration in seconds.
    ///
    /// Exceeding this produces a warning, never a validation error.
    pub fn with_max_duration(mut self, seconds: f64) -> Self {
        self.max_duration = seconds;
        self
    }

    /// Set the minimum acceptable resolution.
    pub fn with_min_resolution(mut self, width: u32, height: u32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    /// Set the load timeout in milliseconds.
    pub fn with_load_timeout_ms(mut self, milliseconds: u64) -> Self {
        self.load_timeout_ms = milliseconds;
        self
    }
}
