/// Sync orchestration
///
/// The backup, restore and organize passes that drive idempotent, crash-safe
/// synchronization between the local snapshot and the remote service, plus the
/// run-scoped context threaded through every pass.

pub mod backup;
pub mod context;
pub mod organize;
pub mod restore;

pub use backup::{run_backup, BackupOptions, BackupSummary};
pub use context::SyncContext;
pub use organize::{run_organize, OrganizeSummary};
pub use restore::{run_direct_restore, run_restore, RestoreOptions, RestoreSummary};

use anyhow::Result;
use std::io::{self, Write};

/// Ask the user to confirm a mutating run
///
/// The only cooperative cancellation point: once the caller proceeds past
/// this gate, the run completes or fails per definition. `assume_yes` is the
/// `--yes` flag for scripted use.
pub fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("{} [y/N]: ", question);
    io::stdout()
        .flush()
        .map_err(|e| anyhow::anyhow!("Failed to flush stdout: {}", e))?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;

    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
