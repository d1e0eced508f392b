//! Batch validation integration tests.
//!
//! A test-local routing backend maps each locator to its own scripted mock
//! so a single batch can mix passing, failing, and timing-out pipelines.

use std::sync::Arc;

use clipcheck::mock::{LoadScript, MockBackend};
use clipcheck::{
    BatchSummary, ClipCheckError, MediaBackend, MediaErrorCode, MediaHandle, MediaLocator,
    Thresholds, validate_batch,
};

/// Routes locators to scripted mocks by substring: anything containing
/// `bad` fails to load, anything containing `slow` never signals, the rest
/// load as 10-second 1280×720 clips.
struct RoutingBackend {
    good: MockBackend,
    bad: MockBackend,
    slow: MockBackend,
}

impl RoutingBackend {
    fn new() -> Self {
        Self {
            good: MockBackend::ready(10.0, 1280, 720),
            bad: MockBackend::new(LoadScript::Fail(MediaErrorCode::NETWORK)),
            slow: MockBackend::new(LoadScript::Silent),
        }
    }
}

impl MediaBackend for RoutingBackend {
    fn open(&self, locator: &MediaLocator) -> Result<MediaHandle, ClipCheckError> {
        if locator.as_str().contains("bad") {
            self.bad.open(locator)
        } else if locator.as_str().contains("slow") {
            self.slow.open(locator)
        } else {
            self.good.open(locator)
        }
    }
}

#[tokio::test]
async fn empty_batch_produces_a_zeroed_summary() {
    let backend = Arc::new(MockBackend::ready(10.0, 1280, 720));
    let summary = validate_batch(backend, Vec::new(), Thresholds::new()).await;

    assert_eq!(summary.total, 0);
    assert_eq!(summary.passed, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.pass_rate, 0.0);
    assert_eq!(summary.avg_duration, 0.0);
    assert!(summary.errors.is_empty());
    assert!(summary.warnings.is_empty());
    assert!(summary.outcomes.is_empty());
}

#[tokio::test]
async fn all_passing_batch() {
    let backend = Arc::new(MockBackend::ready(10.0, 1280, 720));
    let inputs = vec!["a.mp4".to_string(), "b.mp4".to_string(), "c.mp4".to_string()];
    let summary = validate_batch(Arc::clone(&backend), inputs, Thresholds::new()).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.pass_rate, 100.0);
    assert_eq!(summary.avg_duration, 10.0);
    assert!(summary.errors.is_empty());

    // One open, one release per pipeline.
    assert_eq!(backend.release_count(), 3);
}

#[tokio::test]
async fn mixed_batch_keeps_input_order() {
    let backend = Arc::new(RoutingBackend::new());
    let inputs = vec![
        "good-1.mp4".to_string(),
        "bad-1.mp4".to_string(),
        "good-2.mp4".to_string(),
        "bad-2.mp4".to_string(),
    ];
    let summary = validate_batch(backend, inputs, Thresholds::new()).await;

    assert_eq!(summary.total, 4);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.pass_rate, 50.0);

    // Outcomes follow input order regardless of completion order.
    assert!(summary.outcomes[0].valid);
    assert!(!summary.outcomes[1].valid);
    assert!(summary.outcomes[2].valid);
    assert!(!summary.outcomes[3].valid);

    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors.iter().all(|error| error.contains("Network error")));
}

#[tokio::test(start_paused = true)]
async fn one_stuck_pipeline_never_blocks_the_rest() {
    let backend = Arc::new(RoutingBackend::new());
    let inputs = vec![
        "good.mp4".to_string(),
        "slow.mp4".to_string(),
        "bad.mp4".to_string(),
    ];
    let thresholds = Thresholds::new().with_load_timeout_ms(1_000);
    let summary = validate_batch(backend, inputs, thresholds).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 2);
    assert!(summary.outcomes[1].errors[0].contains("Timeout"));
    assert!(summary.outcomes[2].errors[0].contains("Network error"));
}

#[tokio::test]
async fn average_duration_skips_inputs_without_usable_metadata() {
    let backend = Arc::new(RoutingBackend::new());
    let inputs = vec!["good.mp4".to_string(), "bad.mp4".to_string()];
    let summary = validate_batch(backend, inputs, Thresholds::new()).await;

    // The failed pipeline's metadata has no positive duration.
    assert_eq!(summary.avg_duration, 10.0);
}

/// A backend whose `open` panics, crashing any pipeline that uses it.
struct PanickingBackend;

impl MediaBackend for PanickingBackend {
    fn open(&self, _locator: &MediaLocator) -> Result<MediaHandle, ClipCheckError> {
        panic!("decoder backend crashed");
    }
}

#[tokio::test]
async fn panicked_pipeline_becomes_a_failed_outcome() {
    let backend = Arc::new(PanickingBackend);
    let inputs = vec!["a.mp4".to_string()];
    let summary = validate_batch(backend, inputs, Thresholds::new()).await;

    assert_eq!(summary.total, 1);
    assert_eq!(summary.failed, 1);
    let outcome = &summary.outcomes[0];
    assert!(!outcome.valid);
    assert!(outcome.errors[0].contains("aborted"));
    assert!(
        outcome.validated_at_ms > 0,
        "fallback outcomes carry a real timestamp like every other outcome",
    );
}

#[tokio::test]
async fn warnings_aggregate_like_errors() {
    let backend = Arc::new(MockBackend::ready(45.0, 1280, 720));
    let inputs = vec!["a.mp4".to_string(), "b.mp4".to_string()];
    let thresholds = Thresholds::new().with_max_duration(30.0);
    let summary = validate_batch(backend, inputs, thresholds).await;

    assert_eq!(summary.passed, 2, "the soft ceiling does not fail clips");
    assert_eq!(summary.warnings.len(), 2);
}

#[test]
fn summary_from_outcomes_matches_manual_aggregation() {
    let outcomes = vec![
        clipcheck::ValidationOutcome {
            valid: true,
            metadata: None,
            errors: Vec::new(),
            warnings: vec!["w1".to_string()],
            validated_at_ms: 1,
        },
        clipcheck::ValidationOutcome {
            valid: false,
            metadata: None,
            errors: vec!["e1".to_string(), "e2".to_string()],
            warnings: Vec::new(),
            validated_at_ms: 2,
        },
    ];

    let summary = BatchSummary::from_outcomes(outcomes);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.pass_rate, 50.0);
    assert_eq!(summary.errors, vec!["e1".to_string(), "e2".to_string()]);
    assert_eq!(summary.warnings, vec!["w1".to_string()]);
}
