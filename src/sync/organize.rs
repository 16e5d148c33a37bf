/// Organize pass over an existing local snapshot
///
/// Re-applies the business-key layout to a hand-edited snapshot directory:
/// tag subdirectories, sanitized filenames, deterministic collision suffixes,
/// duplicate cleanup, and a name-based reference resolution over the set so
/// the reference graph is consistent without a remote round-trip.

use crate::resolver::{self, SyncReport, Universe};
use crate::snapshot;
use anyhow::Result;
use std::path::Path;

/// Counters reported at the end of an organize run
#[derive(Debug, Default)]
pub struct OrganizeSummary {
    /// Files moved to their conventional location
    pub moved: usize,
    /// Identical suffixed duplicates removed
    pub deduplicated: usize,
    /// References rewritten to name-based form
    pub references_fixed: usize,
    /// References whose target is absent from the snapshot
    pub references_unresolved: usize,
}

/// Re-lay-out and re-resolve the snapshot directory in place
pub fn run_organize(input_dir: &Path) -> Result<OrganizeSummary> {
    tracing::info!("🗂️ Organizing snapshot directory '{}'", input_dir.display());
    let moved = snapshot::organize_tree(input_dir)?;
    let deduplicated = snapshot::remove_duplicate_suffixes(input_dir)?;

    let entries = snapshot::read_tree(input_dir)?;
    let universe_set: Vec<_> = entries.iter().map(|(_, d)| d.clone()).collect();
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    for (path, mut definition) in entries {
        let changed = resolver::to_name_based(&mut definition, &universe, &mut report);
        if changed > 0 {
            snapshot::write_definition(&path, &definition)?;
        }
    }
    for unresolved in &report.unresolved {
        tracing::warn!(
            "Unresolved reference in '{}' / '{}': target '{}' is not in the snapshot",
            unresolved.definition_name,
            unresolved.node_name,
            unresolved.value
        );
    }

    tracing::info!(
        "✅ Organize complete: {} moved, {} duplicates removed, {} references rewritten",
        moved,
        deduplicated,
        report.fixed
    );
    Ok(OrganizeSummary {
        moved,
        deduplicated,
        references_fixed: report.fixed,
        references_unresolved: report.not_found,
    })
}
