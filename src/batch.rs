//! Concurrent batch validation.
//!
//! [`validate_batch`] fans a set of locators out into independent
//! validation pipelines — one spawned task per input, no bound on fan-out,
//! no cancellation of siblings when one fails — and aggregates the results
//! into a [`BatchSummary`]. Every pipeline runs to completion; failures are
//! captured inside each pipeline's own outcome, never propagated.
//!
//! Outcomes complete in any order, but aggregation is deterministic
//! relative to input order: per-outcome error/warning ordering first, then
//! outcome order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::MediaBackend;
use crate::thresholds::Thresholds;
use crate::validator::{ValidationOutcome, epoch_millis, validate_media};

/// Aggregate statistics over a batch of validation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Number of inputs processed.
    pub total: usize,
    /// Outcomes with `valid == true`.
    pub passed: usize,
    /// `total - passed`.
    pub failed: usize,
    /// `passed / total * 100`, or `0` for an empty batch.
    pub pass_rate: f64,
    /// Arithmetic mean of duration over outcomes whose metadata has a
    /// positive duration, or `0` when none do.
    pub avg_duration: f64,
    /// All errors across the batch, input order preserved.
    pub errors: Vec<String>,
    /// All warnings across the batch, input order preserved.
    pub warnings: Vec<String>,
    /// The per-input outcomes, in input order.
    pub outcomes: Vec<ValidationOutcome>,
}

impl BatchSummary {
    /// Aggregate a set of outcomes (already in input order).
    pub fn from_outcomes(outcomes: Vec<ValidationOutcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|outcome| outcome.valid).count();
        let failed = total - passed;
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        let durations: Vec<f64> = outcomes
            .iter()
            .filter_map(|outcome| outcome.metadata.as_ref())
            .map(|metadata| metadata.duration_seconds)
            .filter(|duration| *duration > 0.0)
            .collect();
        let avg_duration = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };

        let errors = outcomes
            .iter()
            .flat_map(|outcome| outcome.errors.iter().cloned())
            .collect();
        let warnings = outcomes
            .iter()
            .flat_map(|outcome| outcome.warnings.iter().cloned())
            .collect();

        Self {
            total,
            passed,
            failed,
            pass_rate,
            avg_duration,
            errors,
            warnings,
            outcomes,
        }
    }
}

/// Validate many locators concurrently and aggregate a summary.
///
/// Launches one independent pipeline per locator with unbounded fan-out.
/// Each pipeline opens its own handle and tears it down on its own terminal
/// transition; handles are never shared or pooled. A pipeline that panics
/// is converted into a failed outcome for that input — the batch itself
/// never fails.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use clipcheck::ffmpeg::FfmpegBackend;
/// use clipcheck::{Thresholds, validate_batch};
///
/// # async fn example() {
/// let backend = Arc::new(FfmpegBackend::new());
/// let inputs = vec!["a.mp4".to_string(), "b.mp4".to_string()];
/// let summary = validate_batch(backend, inputs, Thresholds::new()).await;
/// println!("{}/{} passed ({:.0}%)", summary.passed, summary.total, summary.pass_rate);
/// # }
/// ```
pub async fn validate_batch<B>(
    backend: Arc<B>,
    locators: Vec<String>,
    thresholds: Thresholds,
) -> BatchSummary
where
    B: MediaBackend + 'static,
{
    let handles: Vec<_> = locators
        .into_iter()
        .map(|locator| {
            let backend = Arc::clone(&backend);
            let thresholds = thresholds.clone();
            tokio::spawn(
                async move { validate_media(backend.as_ref(), &locator, &thresholds).await },
            )
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => {
                log::warn!("validation task aborted: {error}");
                outcomes.push(ValidationOutcome {
                    valid: false,
                    metadata: None,
                    errors: vec![format!("Validation task aborted: {error}")],
                    warnings: Vec::new(),
                    validated_at_ms: epoch_millis(),
                });
            }
        }
    }

    BatchSummary::from_outcomes(outcomes)
}
