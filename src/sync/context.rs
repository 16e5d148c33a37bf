/// Run-scoped synchronization context
///
/// Explicit state threaded through orchestrator calls instead of process-wide
/// caches: the `oldId -> newId` mapping built as definitions are imported, and
/// the name locks that stop two ensure-exists attempts for the same name from
/// both creating within a single run.

use std::collections::{HashMap, HashSet};

/// State scoped to one import run
#[derive(Debug, Default)]
pub struct SyncContext {
    id_mapping: HashMap<String, String>,
    name_locks: HashSet<String>,
    created_by_name: HashMap<String, String>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a definition previously known under `old_id` now lives
    /// under `new_id`; consulted by the repair pass before name matching
    pub fn record_id_change(&mut self, old_id: &str, new_id: &str) {
        if old_id != new_id {
            self.id_mapping
                .insert(old_id.to_string(), new_id.to_string());
        }
    }

    /// This run's `oldId -> newId` mapping
    pub fn id_mapping(&self) -> &HashMap<String, String> {
        &self.id_mapping
    }

    /// Claim a name before attempting a create; false when a create for this
    /// name already ran in this pass
    pub fn claim_name(&mut self, name: &str) -> bool {
        self.name_locks.insert(name.to_string())
    }

    /// Record the id assigned to a definition created under `name`
    pub fn record_creation(&mut self, name: &str, id: &str) {
        self.created_by_name
            .insert(name.to_string(), id.to_string());
    }

    /// The id this run already created for `name`, if any
    pub fn created_id(&self, name: &str) -> Option<&str> {
        self.created_by_name.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mappings_are_not_recorded() {
        let mut context = SyncContext::new();
        context.record_id_change("same", "same");
        context.record_id_change("old", "new");
        assert_eq!(context.id_mapping().len(), 1);
        assert_eq!(context.id_mapping().get("old").map(String::as_str), Some("new"));
    }

    #[test]
    fn a_name_can_only_be_claimed_once_per_run() {
        let mut context = SyncContext::new();
        assert!(context.claim_name("Billing"));
        assert!(!context.claim_name("Billing"));

        context.record_creation("Billing", "wf-9");
        assert_eq!(context.created_id("Billing"), Some("wf-9"));
        assert_eq!(context.created_id("Other"), None);
    }
}
