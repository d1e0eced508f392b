//! Collaborator utility tests: workflow shape validation, stability
//! presets, correlation ids, and environment preflight.

use serde_json::json;

use clipcheck::{
    CorrelationContext, ProcessingFlags, StabilityProfile, WorkflowFormat, run_preflight,
    validate_workflow,
};

#[test]
fn api_graph_with_required_nodes_is_valid() {
    let document = json!({
        "3": {"class_type": "KSampler", "inputs": {}},
        "8": {"class_type": "VAEDecode", "inputs": {}},
        "9": {"class_type": "KSampler", "inputs": {}},
    });
    let report = validate_workflow(
        &document,
        &["KSampler".to_string(), "VAEDecode".to_string()],
    );

    assert!(report.valid);
    assert_eq!(report.format, WorkflowFormat::ApiGraph);
    // Encounter order, deduplicated.
    assert_eq!(report.node_types, vec!["KSampler", "VAEDecode"]);
    assert!(report.missing_nodes.is_empty());
    assert!(report.errors.is_empty());
}

#[test]
fn missing_required_nodes_are_errors() {
    let document = json!({
        "3": {"class_type": "KSampler", "inputs": {}},
    });
    let report = validate_workflow(&document, &["VAEDecode".to_string()]);

    assert!(!report.valid);
    assert_eq!(report.missing_nodes, vec!["VAEDecode"]);
    assert!(report.errors[0].contains("VAEDecode"));
}

#[test]
fn ui_graph_is_recognised_with_a_conversion_warning() {
    let document = json!({
        "nodes": [
            {"id": 1, "type": "KSampler"},
            {"id": 2, "type": "VAEDecode"},
        ],
        "links": [],
    });
    let report = validate_workflow(&document, &["KSampler".to_string()]);

    assert!(report.valid);
    assert_eq!(report.format, WorkflowFormat::UiGraph);
    assert_eq!(report.node_types, vec!["KSampler", "VAEDecode"]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("API format"));
}

#[test]
fn empty_graph_is_an_error() {
    let report = validate_workflow(&json!({}), &[]);

    assert!(!report.valid);
    assert_eq!(report.format, WorkflowFormat::ApiGraph);
    assert!(report.errors[0].contains("no nodes"));
}

#[test]
fn unrecognised_shapes_are_rejected() {
    for document in [json!([1, 2, 3]), json!("not a graph"), json!({"a": 1})] {
        let report = validate_workflow(&document, &[]);
        assert!(!report.valid, "should reject {document}");
        assert_eq!(report.format, WorkflowFormat::Unknown);
    }
}

#[test]
fn node_without_inputs_only_warns() {
    let document = json!({
        "3": {"class_type": "KSampler"},
    });
    let report = validate_workflow(&document, &[]);

    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn profile_ids_resolve_case_sensitively() {
    assert_eq!(StabilityProfile::from_id("stable"), Some(StabilityProfile::Stable));
    assert_eq!(StabilityProfile::from_id("balanced"), Some(StabilityProfile::Balanced));
    assert_eq!(StabilityProfile::from_id("fast"), Some(StabilityProfile::Fast));
    assert_eq!(StabilityProfile::from_id("Stable"), None);
    assert_eq!(StabilityProfile::from_id("turbo"), None);
}

#[test]
fn profiles_order_from_conservative_to_aggressive() {
    let stable = StabilityProfile::Stable.flags();
    let balanced = StabilityProfile::Balanced.flags();
    let fast = StabilityProfile::Fast.flags();

    assert!(!stable.skip_layer_guidance && !stable.tiled_decode);
    assert_eq!(stable.cache_threshold, 0.0, "stable disables caching");
    assert!(balanced.cache_threshold < fast.cache_threshold);
    assert!(fast.tiled_decode);

    assert_eq!(ProcessingFlags::default(), balanced);
}

#[test]
fn overrides_replace_only_the_given_fields() {
    let flags = StabilityProfile::Stable
        .flags()
        .with_overrides(None, Some(0.5), Some(true));

    assert!(!flags.skip_layer_guidance, "unset override keeps the preset");
    assert_eq!(flags.cache_threshold, 0.5);
    assert!(flags.tiled_decode);
}

#[test]
fn correlation_ids_are_prefixed_and_unique() {
    let context = CorrelationContext::new("validate");
    let first = context.next_id();
    let second = context.next_id();

    assert!(first.starts_with("validate-"));
    assert_ne!(first, second, "the embedded counter keeps ids distinct");
    assert_eq!(context.issued(), 2);
    assert_eq!(context.recent_ids(), vec![first, second]);
}

#[test]
fn correlation_history_is_bounded() {
    let context = CorrelationContext::with_capacity("req", 3);
    let ids: Vec<String> = (0..5).map(|_| context.next_id()).collect();

    assert_eq!(context.capacity(), 3);
    assert_eq!(context.issued(), 5);
    // Oldest first, trimmed to the last three.
    assert_eq!(context.recent_ids(), ids[2..].to_vec());
}

#[test]
fn contexts_are_independent() {
    let a = CorrelationContext::new("a");
    let b = CorrelationContext::new("b");
    a.next_id();

    assert_eq!(a.issued(), 1);
    assert_eq!(b.issued(), 0);
    assert!(b.recent_ids().is_empty());
}

#[test]
fn preflight_warnings_match_availability() {
    let report = run_preflight();

    assert_eq!(
        report.all_available(),
        report.ffmpeg_available && report.ffprobe_available,
    );
    let expected_warnings =
        usize::from(!report.ffmpeg_available) + usize::from(!report.ffprobe_available);
    assert_eq!(report.warnings.len(), expected_warnings);
}
