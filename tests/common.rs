//! Common test utilities for building workflow definitions and references.
use flowvault::workflow::{Node, WorkflowDefinition};
use serde_json::{json, Map, Value};

/// Creates a minimal definition with the given id and name.
#[allow(dead_code)]
pub fn definition(id: Option<&str>, name: &str) -> WorkflowDefinition {
    WorkflowDefinition {
        id: id.map(str::to_string),
        name: name.to_string(),
        nodes: Vec::new(),
        connections: json!({}),
        settings: None,
        static_data: None,
        tags: Vec::new(),
        active: false,
        is_archived: None,
        updated_at: None,
        extra: Map::new(),
    }
}

/// Creates a definition whose single node references another workflow.
#[allow(dead_code)]
pub fn definition_with_reference(
    id: Option<&str>,
    name: &str,
    node_name: &str,
    reference: Value,
) -> WorkflowDefinition {
    let mut def = definition(id, name);
    def.nodes.push(caller_node(node_name, reference));
    def
}

/// Creates a subworkflow-call node with the given raw reference object.
#[allow(dead_code)]
pub fn caller_node(node_name: &str, reference: Value) -> Node {
    Node {
        name: node_name.to_string(),
        kind: "core.executeSubworkflow".to_string(),
        parameters: json!({ "workflowId": reference, "waitForCompletion": true }),
        extra: Map::new(),
    }
}

/// Raw id-mode reference object with an optional cached display name.
#[allow(dead_code)]
pub fn id_reference(value: &str, cached_name: Option<&str>) -> Value {
    let mut reference = json!({ "__rl": true, "mode": "id", "value": value });
    if let Some(name) = cached_name {
        reference["cachedResultName"] = json!(name);
    }
    reference
}

/// Raw name-mode reference object.
#[allow(dead_code)]
pub fn name_reference(value: &str) -> Value {
    json!({ "__rl": true, "mode": "list", "value": value, "cachedResultName": value })
}

/// Reads the reference back out of the definition's first node.
#[allow(dead_code)]
pub fn first_reference(def: &WorkflowDefinition) -> flowvault::workflow::CrossWorkflowReference {
    def.nodes[0]
        .cross_reference()
        .expect("definition should carry a reference")
}
