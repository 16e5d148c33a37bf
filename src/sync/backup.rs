/// Backup orchestrator
///
/// Pulls the full remote inventory into a temporary directory, renames files
/// by the stable business-key convention, deduplicates, rewrites references to
/// name-based form, and atomically swaps the result into the live snapshot
/// directory. An interrupted run never touches the live directory.

use crate::remote::RemoteClient;
use crate::resolver::{self, SyncReport, Universe};
use crate::snapshot;
use crate::sync::confirm;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;

/// Options for one backup run
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Live snapshot directory to replace
    pub output_dir: PathBuf,
    /// Skip the confirmation gate (`--yes`)
    pub assume_yes: bool,
}

/// Counters reported at the end of a backup run
#[derive(Debug, Default)]
pub struct BackupSummary {
    /// Definitions written to the snapshot
    pub exported: usize,
    /// Archived definitions skipped during enumeration
    pub skipped_archived: usize,
    /// Identical same-name duplicates collapsed
    pub deduplicated: usize,
    /// References rewritten to name-based form
    pub references_fixed: usize,
    /// References whose target was not found in the inventory
    pub references_unresolved: usize,
}

/// Run a full backup pass
///
/// Returns `None` when the user declines the confirmation gate; the live
/// directory is untouched in that case.
pub async fn run_backup(
    client: &RemoteClient,
    options: &BackupOptions,
) -> Result<Option<BackupSummary>> {
    tracing::info!("📥 Enumerating the remote workflow inventory");
    let inventory = client.list().await?;
    let total = inventory.len();
    let definitions: Vec<_> = inventory.into_iter().filter(|d| !d.archived()).collect();
    let skipped_archived = total - definitions.len();
    if skipped_archived > 0 {
        tracing::info!("Skipping {} archived workflows", skipped_archived);
    }

    // Fresh temp area keyed by remote id; id-keyed files cannot collide even
    // when the inventory holds duplicate names
    let temp = snapshot::sibling_with_suffix(&options.output_dir, ".tmp");
    if temp.exists() {
        fs::remove_dir_all(&temp)
            .map_err(|e| anyhow::anyhow!("Failed to clear '{}': {}", temp.display(), e))?;
    }
    tracing::info!("💾 Writing {} workflows to '{}'", definitions.len(), temp.display());
    snapshot::write_raw_by_id(&temp, &definitions)?;

    tracing::info!("🗂️ Renaming files by workflow name");
    snapshot::organize_tree(&temp)?;
    let deduplicated = snapshot::remove_duplicate_suffixes(&temp)?;
    if deduplicated > 0 {
        tracing::info!("Collapsed {} duplicate workflows", deduplicated);
    }

    tracing::info!("🔗 Rewriting cross-workflow references to name-based form");
    let entries = snapshot::read_tree(&temp)?;
    let universe_set: Vec<_> = entries.iter().map(|(_, d)| d.clone()).collect();
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    let mut exported = 0;
    for (path, mut definition) in entries {
        let changed = resolver::to_name_based(&mut definition, &universe, &mut report);
        if changed > 0 {
            snapshot::write_definition(&path, &definition)?;
        }
        exported += 1;
    }
    for unresolved in &report.unresolved {
        tracing::warn!(
            "Unresolved reference in '{}' / '{}': target '{}' is not in the inventory",
            unresolved.definition_name,
            unresolved.node_name,
            unresolved.value
        );
    }

    let question = format!(
        "Replace the local snapshot at '{}' with {} workflows?",
        options.output_dir.display(),
        exported
    );
    if !confirm(&question, options.assume_yes)? {
        tracing::info!("Backup cancelled; the live snapshot was not touched");
        fs::remove_dir_all(&temp)
            .map_err(|e| anyhow::anyhow!("Failed to clear '{}': {}", temp.display(), e))?;
        return Ok(None);
    }

    snapshot::swap_into_place(&options.output_dir, &temp)?;
    tracing::info!(
        "✅ Backup complete: {} workflows in '{}'",
        exported,
        options.output_dir.display()
    );

    Ok(Some(BackupSummary {
        exported,
        skipped_archived,
        deduplicated,
        references_fixed: report.fixed,
        references_unresolved: report.not_found,
    }))
}
