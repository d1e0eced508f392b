//! Workflow-description shape validation.
//!
//! Downstream processing consumes a JSON workflow description (a node
//! graph). [`validate_workflow`] is the pure shape check for that payload:
//! it detects which of the two observed graph layouts the document uses,
//! collects the node types present, and reports any required node types
//! that are missing. It never touches the media core.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which graph layout a workflow document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowFormat {
    /// Flat map of node id → `{class_type, inputs}` objects.
    ApiGraph,
    /// Editor export with a top-level `nodes` array.
    UiGraph,
    /// Neither layout was recognised.
    Unknown,
}

/// Result of validating one workflow description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    /// `true` iff no errors were recorded.
    pub valid: bool,
    /// Detected graph layout.
    pub format: WorkflowFormat,
    /// Node types present in the document, in encounter order, deduplicated.
    pub node_types: Vec<String>,
    /// Required node types that were not found.
    pub missing_nodes: Vec<String>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
    /// Fatal shape problems.
    pub errors: Vec<String>,
}

/// Validate the shape of a workflow description.
///
/// `required_nodes` lists node types the caller expects the graph to
/// contain; each absent one is recorded in `missing_nodes` and as an error.
/// Pure and synchronous.
///
/// # Example
///
/// ```
/// use clipcheck::workflow::validate_workflow;
/// use serde_json::json;
///
/// let document = json!({
///     "3": {"class_type": "KSampler", "inputs": {}},
///     "8": {"class_type": "VAEDecode", "inputs": {}},
/// });
/// let report = validate_workflow(&document, &["KSampler".to_string()]);
/// assert!(report.valid);
/// assert!(report.missing_nodes.is_empty());
/// ```
pub fn validate_workflow(document: &Value, required_nodes: &[String]) -> WorkflowReport {
    let mut node_types = Vec::new();
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let format = detect_format(document);
    match format {
        WorkflowFormat::ApiGraph => {
            let nodes = document.as_object().map(|map| map.len()).unwrap_or(0);
            if nodes == 0 {
                errors.push("Workflow graph contains no nodes".to_string());
            }
            if let Some(map) = document.as_object() {
                for node in map.values() {
                    if let Some(class_type) = node.get("class_type").and_then(Value::as_str) {
                        push_unique(&mut node_types, class_type);
                    }
                    if node.get("inputs").is_none() {
                        warnings.push("Node without an inputs map".to_string());
                    }
                }
            }
        }
        WorkflowFormat::UiGraph => {
            let nodes = document
                .get("nodes")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if nodes.is_empty() {
                errors.push("Workflow graph contains no nodes".to_string());
            }
            for node in nodes {
                if let Some(node_type) = node.get("type").and_then(Value::as_str) {
                    push_unique(&mut node_types, node_type);
                }
            }
            warnings.push(
                "UI-format workflow: convert to API format before submission".to_string(),
            );
        }
        WorkflowFormat::Unknown => {
            errors.push("Unrecognised workflow document shape".to_string());
        }
    }

    let missing_nodes: Vec<String> = required_nodes
        .iter()
        .filter(|required| !node_types.iter().any(|found| found == *required))
        .cloned()
        .collect();
    for missing in &missing_nodes {
        errors.push(format!("Required node type missing: {missing}"));
    }

    WorkflowReport {
        valid: errors.is_empty(),
        format,
        node_types,
        missing_nodes,
        warnings,
        errors,
    }
}

/// Classify the document into one of the two known graph layouts.
fn detect_format(document: &Value) -> WorkflowFormat {
    if document
        .get("nodes")
        .map(Value::is_array)
        .unwrap_or(false)
    {
        return WorkflowFormat::UiGraph;
    }

    let Some(map) = document.as_object() else {
        return WorkflowFormat::Unknown;
    };
    if !map.is_empty()
        && map
            .values()
            .all(|node| node.get("class_type").is_some())
    {
        return WorkflowFormat::ApiGraph;
    }

    // An empty object is shaped like an API graph with no nodes.
    if map.is_empty() {
        return WorkflowFormat::ApiGraph;
    }
    WorkflowFormat::Unknown
}

fn push_unique(node_types: &mut Vec<String>, candidate: &str) {
    if !node_types.iter().any(|existing| existing == candidate) {
        node_types.push(candidate.to_string());
    }
}
