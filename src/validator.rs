//! Clip validation.
//!
//! [`evaluate`] is the pure threshold check: it maps a resolved loading
//! outcome plus a [`Thresholds`] config to a structured
//! [`ValidationOutcome`]. [`validate_media`] is the full pipeline — open the
//! locator, run the readiness race, evaluate, and release the resource.
//! Nothing here is fatal: every failure mode resolves to a structured
//! outcome with `valid == errors.is_empty()` holding by construction.
//!
//! # Example
//!
//! ```no_run
//! use clipcheck::ffmpeg::FfmpegBackend;
//! use clipcheck::{Thresholds, validate_media};
//!
//! # async fn example() {
//! let backend = FfmpegBackend::new();
//! let outcome = validate_media(&backend, "clip.mp4", &Thresholds::new()).await;
//! if !outcome.valid {
//!     for error in &outcome.errors {
//!         eprintln!("{error}");
//!     }
//! }
//! # }
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::backend::{MediaBackend, MediaLocator};
use crate::metadata::{FailureReason, ResolvedMetadata};
use crate::race::{LoadOutcome, ReadinessRace};
use crate::thresholds::Thresholds;

/// The structured result of one validation attempt.
///
/// Serializes to the JSON shape callers consume directly:
/// `{valid, metadata, errors, warnings, validatedAt}`, with any load
/// failure also surfaced under `metadata.error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    /// `true` iff no errors were recorded.
    pub valid: bool,
    /// Metadata resolved for the attempt, when loading got far enough to
    /// produce any.
    pub metadata: Option<ResolvedMetadata>,
    /// Hard failures. A single load failure short-circuits as the sole
    /// entry; threshold violations accumulate.
    pub errors: Vec<String>,
    /// Soft issues (currently only the duration ceiling).
    pub warnings: Vec<String>,
    /// When the outcome was produced, in epoch milliseconds.
    #[serde(rename = "validatedAt")]
    pub validated_at_ms: u64,
}

impl ValidationOutcome {
    fn build(
        metadata: Option<ResolvedMetadata>,
        errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            valid: errors.is_empty(),
            metadata,
            errors,
            warnings,
            validated_at_ms: epoch_millis(),
        }
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Outcome for an empty locator: recorded without ever attempting a load.
fn no_input_outcome() -> ValidationOutcome {
    ValidationOutcome::build(None, vec!["No input video provided".to_string()], Vec::new())
}

/// Map a loading outcome and thresholds to a validation outcome.
///
/// Pure and synchronous. Decision order:
///
/// 1. Empty locator → "No input" error, nothing else runs.
/// 2. Failed or timed-out load → the failure message is the sole error.
/// 3. Unplayable resource → sole error.
/// 4. Duration checks (invalid / too short are errors; over the maximum is
///    a warning only).
/// 5. Resolution checks (invalid / below minimum are errors).
///
/// Steps 4 and 5 are independent: a clip that is both too short and too
/// small accumulates both errors in one outcome.
pub fn evaluate(
    locator: &MediaLocator,
    outcome: &LoadOutcome,
    thresholds: &Thresholds,
) -> ValidationOutcome {
    if locator.is_empty() {
        return no_input_outcome();
    }

    let metadata = match outcome {
        LoadOutcome::Ready(metadata) => metadata.clone(),
        LoadOutcome::Failed(reason) => {
            return ValidationOutcome::build(
                Some(ResolvedMetadata::from_failure(reason.clone())),
                vec![reason.message.clone()],
                Vec::new(),
            );
        }
        LoadOutcome::TimedOut { elapsed_ms } => {
            let reason = FailureReason::timeout(*elapsed_ms);
            return ValidationOutcome::build(
                Some(ResolvedMetadata::from_failure(reason.clone())),
                vec![reason.message],
                Vec::new(),
            );
        }
    };

    if !metadata.playable {
        let level = metadata.readiness_level;
        return ValidationOutcome::build(
            Some(metadata),
            vec![format!("Video cannot be played (readiness level {level})")],
            Vec::new(),
        );
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let duration = metadata.duration_seconds;
    if !duration.is_finite() || duration <= 0.0 {
        errors.push(format!("Invalid video duration: {duration}"));
    } else if duration < thresholds.min_duration {
        errors.push(format!(
            "Video too short: {duration:.2}s (minimum {:.2}s)",
            thresholds.min_duration,
        ));
    } else if duration > thresholds.max_duration {
        warnings.push(format!(
            "Video exceeds maximum duration: {duration:.2}s (maximum {:.2}s)",
            thresholds.max_duration,
        ));
    }

    let (width, height) = (metadata.width_px, metadata.height_px);
    if width == 0 || height == 0 {
        errors.push(format!("Invalid video resolution: {width}×{height}"));
    } else if width < thresholds.min_width || height < thresholds.min_height {
        errors.push(format!(
            "Resolution too low: {width}×{height} (minimum {}×{})",
            thresholds.min_width, thresholds.min_height,
        ));
    }

    ValidationOutcome::build(Some(metadata), errors, warnings)
}

/// Validate a media locator end to end.
///
/// Opens the locator through `backend`, races readiness against the
/// configured timeout, evaluates thresholds, and releases the resource
/// before returning. Never fails — open errors, load failures, and
/// timeouts all land in the returned outcome.
pub async fn validate_media<B: MediaBackend>(
    backend: &B,
    locator: &str,
    thresholds: &Thresholds,
) -> ValidationOutcome {
    let locator = MediaLocator::new(locator);
    if locator.is_empty() {
        // Never attempt loading for an empty locator.
        return no_input_outcome();
    }

    log::debug!("validating {locator}");

    let handle = match backend.open(&locator) {
        Ok(handle) => handle,
        Err(error) => {
            // An open that fails outright behaves like a network-level load
            // failure: structured, never thrown.
            let reason = FailureReason {
                kind: crate::metadata::FailureKind::Network,
                message: error.to_string(),
            };
            return evaluate(&locator, &LoadOutcome::Failed(reason), thresholds);
        }
    };

    let race = ReadinessRace::new(handle);
    let (outcome, handle) = race.resolve(thresholds.load_timeout_ms).await;

    // The validator only needs the captured metadata; release immediately.
    if let Some(mut handle) = handle {
        handle.release();
    }

    evaluate(&locator, &outcome, thresholds)
}
