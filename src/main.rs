/// Flowvault: workflow definition backup and restore CLI
///
/// Synchronizes a local directory of workflow-definition JSON files with a
/// remote automation service, reconciling cross-workflow references around
/// every pass. Exit code 0 on success or no-op (including a declined
/// confirmation); non-zero on any aborted run.

use clap::{Parser, Subcommand};
use flowvault::config::Config;
use flowvault::remote::RemoteClient;
use flowvault::sync::{
    run_backup, run_direct_restore, run_organize, run_restore, BackupOptions, RestoreOptions,
};
use std::path::PathBuf;

/// Backup and restore workflow definitions against a remote automation service
#[derive(Parser, Debug)]
#[command(name = "flowvault", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pull the remote workflow inventory into the local snapshot directory
    Backup {
        /// Snapshot directory to write (defaults to FLOWVAULT_DIR)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Import changed and new local definitions into the remote service
    Restore {
        /// Snapshot directory to read (defaults to FLOWVAULT_DIR)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Write straight into the service's backing store, keeping ids
        /// (the service must be stopped)
        #[arg(long)]
        preserve_ids: bool,
    },
    /// Re-apply the naming layout to an existing snapshot directory
    Organize {
        /// Snapshot directory to organize (defaults to FLOWVAULT_DIR)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = Config::default();

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Backup { output, yes } => {
            let client = RemoteClient::new(&config.remote)?;
            let options = BackupOptions {
                output_dir: output.unwrap_or_else(|| PathBuf::from(&config.snapshot.snapshot_dir)),
                assume_yes: yes,
            };
            if let Some(summary) = run_backup(&client, &options).await? {
                println!(
                    "Backed up {} workflows ({} archived skipped, {} duplicates collapsed, {} references rewritten, {} unresolved)",
                    summary.exported,
                    summary.skipped_archived,
                    summary.deduplicated,
                    summary.references_fixed,
                    summary.references_unresolved
                );
            }
        }
        Command::Restore {
            input,
            yes,
            preserve_ids,
        } => {
            let options = RestoreOptions {
                input_dir: input.unwrap_or_else(|| PathBuf::from(&config.snapshot.snapshot_dir)),
                assume_yes: yes,
            };
            if preserve_ids {
                if let Some(summary) =
                    run_direct_restore(&config.snapshot.service_db_path, &options).await?
                {
                    println!(
                        "Imported {} workflows directly ({} skipped)",
                        summary.imported, summary.skipped
                    );
                }
            } else {
                let client = RemoteClient::new(&config.remote)?;
                if let Some(summary) = run_restore(&client, &options).await? {
                    println!(
                        "Restored: {} created, {} updated, {} skipped, {} repaired, {} references rewritten, {} unresolved",
                        summary.created,
                        summary.updated,
                        summary.skipped,
                        summary.repaired,
                        summary.references_fixed,
                        summary.references_unresolved
                    );
                }
            }
        }
        Command::Organize { input } => {
            let input_dir = input.unwrap_or_else(|| PathBuf::from(&config.snapshot.snapshot_dir));
            let summary = run_organize(&input_dir)?;
            println!(
                "Organized: {} moved, {} duplicates removed, {} references rewritten, {} unresolved",
                summary.moved,
                summary.deduplicated,
                summary.references_fixed,
                summary.references_unresolved
            );
        }
    }
    Ok(())
}
