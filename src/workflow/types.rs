/// Core workflow type definitions
///
/// Defines the structures for workflow definitions, nodes and cross-workflow
/// references as exchanged with the remote automation service. These types are
/// serialized/deserialized from JSON for both the local snapshot files and the
/// service API; unknown fields round-trip untouched through flattened maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A complete workflow definition - the unit of synchronization
///
/// The `id` is assigned by the remote service and is volatile: it may change on
/// any create and is never meaningful across two service instances. The `name`
/// is the only stable business key and the anchor for reference reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Service-assigned identifier; absent on never-synced local definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-assigned workflow name, the stable business key
    pub name: String,
    /// Ordered list of step descriptors
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Node wiring, keyed by node name; opaque to the sync engine
    #[serde(default)]
    pub connections: Value,
    /// Workflow-level settings; round-tripped as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    /// Persistent per-workflow state; round-tripped as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<Value>,
    /// Remote-managed tag list; rejected by the service on writes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Value>,
    /// Remote-authoritative activation flag
    #[serde(default)]
    pub active: bool,
    /// Remote-authoritative archive flag; archived definitions are not backed up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    /// Last modification time as reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Any other service fields (createdAt, versionId, meta, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDefinition {
    /// Whether the service has flagged this definition as archived
    pub fn archived(&self) -> bool {
        self.is_archived.unwrap_or(false)
    }
}

/// A single step descriptor inside a workflow definition
///
/// The sync engine only interprets the parameters of nodes that embed a
/// cross-workflow reference; everything else is carried through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node name, unique within the workflow and used in audit output
    pub name: String,
    /// Node type discriminator as assigned by the service's node runtime
    #[serde(rename = "type")]
    pub kind: String,
    /// Node-specific configuration parameters as flexible JSON
    #[serde(default)]
    pub parameters: Value,
    /// Remaining node fields (position, credentials, typeVersion, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameter key under which a subworkflow call stores its target reference
const REFERENCE_KEY: &str = "workflowId";

/// Typed view over a node's parameters
///
/// Computed at the parse boundary: a node whose parameters carry a well-formed
/// cross-workflow reference is a subworkflow call; any other shape - including
/// a malformed reference object - is treated as opaque and skipped by the
/// resolver rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeParameters {
    /// Node invokes another workflow and carries a pointer to it
    SubworkflowCall(CrossWorkflowReference),
    /// Parameters the sync engine does not interpret
    Opaque,
}

impl Node {
    /// Classify this node's parameters
    ///
    /// Fails closed: an unexpected shape under the reference key (wrong value
    /// type, unknown addressing mode) yields `Opaque` instead of an error.
    pub fn parameters_view(&self) -> NodeParameters {
        match self.cross_reference() {
            Some(reference) => NodeParameters::SubworkflowCall(reference),
            None => NodeParameters::Opaque,
        }
    }

    /// Extract the cross-workflow reference embedded in this node, if any
    pub fn cross_reference(&self) -> Option<CrossWorkflowReference> {
        let raw = self.parameters.get(REFERENCE_KEY)?;
        if !raw.is_object() {
            return None;
        }
        serde_json::from_value(raw.clone()).ok()
    }

    /// Write an updated reference back into this node's parameters
    ///
    /// No-op when the node has no parameter object to write into.
    pub fn set_cross_reference(&mut self, reference: &CrossWorkflowReference) {
        if let Value::Object(params) = &mut self.parameters {
            if let Ok(raw) = serde_json::to_value(reference) {
                params.insert(REFERENCE_KEY.to_string(), raw);
            }
        }
    }
}

/// Addressing mode of a cross-workflow reference
///
/// `Id` points at the target by its volatile service-assigned identifier;
/// `List` points at it by its stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMode {
    Id,
    List,
}

/// A pointer from one workflow's node to another workflow
///
/// The cached fields are denormalized display hints. They are rebuilt after
/// every resolution pass and are only consulted as a fallback when the id
/// itself has gone stale - never as ground truth for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossWorkflowReference {
    /// Addressing mode: by volatile id or by stable name
    pub mode: ReferenceMode,
    /// The target's id (`mode: id`) or name (`mode: list`)
    pub value: String,
    /// Display hint: the target's name at resolution time
    #[serde(
        default,
        rename = "cachedResultName",
        skip_serializing_if = "Option::is_none"
    )]
    pub cached_result_name: Option<String>,
    /// Display hint: the target's UI path at resolution time
    #[serde(
        default,
        rename = "cachedResultUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub cached_result_url: Option<String>,
    /// Service-side marker fields (e.g., the resource-locator tag)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CrossWorkflowReference {
    /// Build an id-mode reference pointing at the given target
    pub fn to_target_by_id(&self, id: &str, name: &str) -> CrossWorkflowReference {
        CrossWorkflowReference {
            mode: ReferenceMode::Id,
            value: id.to_string(),
            cached_result_name: Some(name.to_string()),
            cached_result_url: Some(format!("/workflow/{}", id)),
            extra: self.extra.clone(),
        }
    }

    /// Build a name-mode reference pointing at the given target
    ///
    /// The URL hint is dropped: it embeds the volatile id and would go stale
    /// the moment the target is recreated.
    pub fn to_target_by_name(&self, name: &str) -> CrossWorkflowReference {
        CrossWorkflowReference {
            mode: ReferenceMode::List,
            value: name.to_string(),
            cached_result_name: Some(name.to_string()),
            cached_result_url: None,
            extra: self.extra.clone(),
        }
    }
}
