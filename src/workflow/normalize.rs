/// Normalizer and differ for workflow definitions
///
/// Strips the fields a remote create/update cycle is free to regenerate, then
/// compares definitions through a canonical sorted-key JSON rendering. Two
/// definitions that differ only in ids, timestamps or other remote bookkeeping
/// compare equal; any change to the definition body does not.

use crate::workflow::types::WorkflowDefinition;
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level fields whose values the remote service owns or regenerates
///
/// These never participate in the semantic diff: a definition re-imported
/// verbatim must compare as unchanged even though the service rewrote them.
const VOLATILE_KEYS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "versionId",
    "triggerCount",
    "shared",
    "meta",
    "active",
    "isArchived",
    "tags",
];

/// Strip volatile fields from a serialized definition
///
/// Operates on the serialized form so that fields the typed model carries in
/// its flattened extras are stripped as well. Used for comparison only - the
/// stored snapshot keeps every round-trippable field.
pub fn normalize(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        for key in VOLATILE_KEYS {
            map.remove(*key);
        }
    }
    value
}

/// Canonical rendering of a definition's normalized form
///
/// Object keys are emitted in sorted order so key ordering differences between
/// the local file and the service response never show up as changes.
pub fn canonical_form(definition: &WorkflowDefinition) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(definition)?;
    Ok(to_canonical_json(&normalize(value)))
}

/// Structural deep-equality over normalized forms
///
/// A serialization failure on either side counts as "not equal", which makes
/// the caller re-import the definition rather than silently skip it.
pub fn equal(a: &WorkflowDefinition, b: &WorkflowDefinition) -> bool {
    match (canonical_form(a), canonical_form(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Render a JSON value with sorted object keys
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => serde_json::to_string(s).unwrap_or_default(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Object(map) => {
            let mut tree = BTreeMap::new();
            for (key, item) in map {
                tree.insert(key, to_canonical_json(item));
            }
            let rendered: Vec<String> = tree
                .into_iter()
                .map(|(key, item)| {
                    format!("{}:{}", serde_json::to_string(key).unwrap_or_default(), item)
                })
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_object_keys() {
        let value = json!({ "b": 1, "a": { "d": true, "c": null } });
        assert_eq!(to_canonical_json(&value), r#"{"a":{"c":null,"d":true},"b":1}"#);
    }

    #[test]
    fn normalize_strips_only_volatile_top_level_keys() {
        let value = json!({
            "id": "w1",
            "versionId": "v9",
            "name": "Keep me",
            "nodes": [{ "id": "n1" }]
        });
        let normalized = normalize(value);
        assert_eq!(normalized.get("id"), None);
        assert_eq!(normalized.get("versionId"), None);
        assert_eq!(normalized["name"], json!("Keep me"));
        // Nested ids are part of the definition body and must survive
        assert_eq!(normalized["nodes"][0]["id"], json!("n1"));
    }
}
