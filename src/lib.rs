/// Flowvault: workflow definition backup, restore and reference reconciliation
///
/// This library keeps a local directory of workflow-definition JSON files in sync
/// with a remote automation service. The service reassigns workflow ids on every
/// create, so the stable key across export/import cycles is the workflow *name*;
/// the resolver rewrites cross-workflow references between name-based and
/// id-based form around every sync pass.

// Core configuration and setup
pub mod config;

// Workflow definition model - types, name conventions, normalization and diffing
pub mod workflow;

// Remote service API client - paginated reads, shaped writes, typed errors
pub mod remote;

// Cross-workflow reference resolver - name<->id rewrites over a universe index
pub mod resolver;

// Local snapshot store - file layout, sanitization, atomic directory swap
pub mod snapshot;

// Direct sqlite import path - identifier-preserving writes into the backing store
pub mod storage;

// Sync orchestration - backup, restore and organize passes
pub mod sync;

// Re-export commonly used types for external consumers
pub use config::Config;
pub use remote::{ApiError, RemoteClient};
pub use resolver::{SyncReport, Universe};
pub use workflow::{CrossWorkflowReference, Node, ReferenceMode, WorkflowDefinition};
