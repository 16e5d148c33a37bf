//! Diff correctness: the normalizer must see through everything the remote
//! service is free to regenerate, and nothing else.
mod common;
use common::{caller_node, definition, id_reference};
use flowvault::workflow::normalize::{canonical_form, equal};
use serde_json::json;

#[test]
fn definitions_differing_only_in_volatile_fields_compare_equal() {
    let mut local = definition(Some("old-id"), "Nightly ETL");
    local.nodes.push(caller_node("Call cleanup", id_reference("b1", Some("Cleanup"))));

    let mut remote = definition(Some("new-id"), "Nightly ETL");
    remote.nodes.push(caller_node("Call cleanup", id_reference("b1", Some("Cleanup"))));
    remote.active = true;
    remote.updated_at = Some("2026-03-01T12:00:00Z".parse().unwrap());
    remote.tags = vec![json!({ "id": "t1", "name": "etl" })];
    remote.extra.insert("versionId".to_string(), json!("v42"));
    remote.extra.insert("createdAt".to_string(), json!("2026-01-01T00:00:00Z"));
    remote.extra.insert("triggerCount".to_string(), json!(7));

    assert!(equal(&local, &remote));
}

#[test]
fn definitions_differing_in_nodes_compare_not_equal() {
    let mut a = definition(Some("w1"), "Nightly ETL");
    a.nodes.push(caller_node("Call cleanup", id_reference("b1", Some("Cleanup"))));

    let mut b = definition(Some("w1"), "Nightly ETL");
    b.nodes.push(caller_node("Call cleanup", id_reference("b2", Some("Cleanup"))));

    assert!(!equal(&a, &b));
}

#[test]
fn settings_changes_are_semantic() {
    let mut a = definition(Some("w1"), "Nightly ETL");
    a.settings = Some(json!({ "timezone": "UTC" }));

    let mut b = definition(Some("w1"), "Nightly ETL");
    b.settings = Some(json!({ "timezone": "Europe/Berlin" }));

    assert!(!equal(&a, &b));
}

#[test]
fn canonical_form_is_stable_across_key_order() {
    // The same definition parsed from differently-ordered JSON must render
    // to one canonical string
    let a: flowvault::workflow::WorkflowDefinition = serde_json::from_value(json!({
        "name": "X",
        "nodes": [],
        "connections": {},
        "settings": { "b": 1, "a": 2 }
    }))
    .unwrap();
    let b: flowvault::workflow::WorkflowDefinition = serde_json::from_value(json!({
        "settings": { "a": 2, "b": 1 },
        "connections": {},
        "nodes": [],
        "name": "X"
    }))
    .unwrap();

    assert_eq!(canonical_form(&a).unwrap(), canonical_form(&b).unwrap());
}
