//! Environment preflight checks.
//!
//! [`run_preflight`] reports whether the external tools the production
//! backend shells out to are actually available. The result is purely
//! informational: the core never gates its behaviour on it, and callers
//! are expected to surface the warnings and carry on.

use std::process::Command;

use serde::{Deserialize, Serialize};

/// Availability snapshot of the external environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    /// Whether `ffmpeg` responded to `-version`.
    pub ffmpeg_available: bool,
    /// Whether `ffprobe` responded to `-version`.
    pub ffprobe_available: bool,
    /// Informational warnings for anything unavailable.
    pub warnings: Vec<String>,
}

impl PreflightReport {
    /// Whether every checked tool is available.
    pub fn all_available(&self) -> bool {
        self.ffmpeg_available && self.ffprobe_available
    }
}

/// Check the external tools the ffmpeg backend depends on.
///
/// Never fails; unavailability is recorded as a warning, not an error.
pub fn run_preflight() -> PreflightReport {
    let ffmpeg_available = binary_responds("ffmpeg");
    let ffprobe_available = binary_responds("ffprobe");

    let mut warnings = Vec::new();
    if !ffmpeg_available {
        warnings.push(
            "ffmpeg not found on PATH — frame sampling will fail at capture time".to_string(),
        );
    }
    if !ffprobe_available {
        warnings.push(
            "ffprobe not found on PATH — media probing will report load failures".to_string(),
        );
    }

    PreflightReport {
        ffmpeg_available,
        ffprobe_available,
        warnings,
    }
}

/// Whether `binary -version` runs and exits successfully.
fn binary_responds(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
