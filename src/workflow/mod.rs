/// Workflow definition model
///
/// Types for the unit of synchronization, the naming conventions built on the
/// stable business key, and the normalizer/differ that decides whether two
/// definitions are semantically equal.

pub mod names;
pub mod normalize;
pub mod types;

pub use types::{
    CrossWorkflowReference, Node, NodeParameters, ReferenceMode, WorkflowDefinition,
};
