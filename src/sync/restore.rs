/// Restore orchestrator
///
/// Diffs the local snapshot against the remote inventory, imports only
/// changed or new definitions, reconciles deleted-and-recreated identities by
/// name, and runs a post-import reference-repair pass across the entire
/// remote inventory. Local files are never modified - the snapshot stays the
/// human-edited source of truth.

use crate::remote::RemoteClient;
use crate::resolver::{self, SyncReport, Universe};
use crate::snapshot;
use crate::storage::{self, DirectImportSummary};
use crate::sync::confirm;
use crate::sync::context::SyncContext;
use crate::workflow::normalize;
use crate::workflow::types::WorkflowDefinition;
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;

/// Options for one restore run
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Snapshot directory to import from
    pub input_dir: PathBuf,
    /// Skip the confirmation gate (`--yes`)
    pub assume_yes: bool,
}

/// Counters reported at the end of a restore run
#[derive(Debug, Default)]
pub struct RestoreSummary {
    /// Definitions created on the service
    pub created: usize,
    /// Definitions updated in place
    pub updated: usize,
    /// Definitions skipped as unchanged
    pub skipped: usize,
    /// Remote definitions rewritten by the repair pass
    pub repaired: usize,
    /// References rewritten across both passes
    pub references_fixed: usize,
    /// References left unresolved across both passes
    pub references_unresolved: usize,
}

/// Per-definition import decision
///
/// `unchanged -> skip`; `new | deleted-remotely -> create`;
/// `changed -> update`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportAction {
    Skip,
    Update { id: String },
    Create { old_id: Option<String> },
}

/// Decide what to do with each local definition
///
/// Comparison only runs when the local id still resolves to a live remote
/// definition; a dead id means the definition was deleted remotely and must
/// be recreated, never diffed.
fn plan_imports(
    locals: &[(PathBuf, WorkflowDefinition)],
    by_remote_id: &HashMap<&str, &WorkflowDefinition>,
) -> Vec<ImportAction> {
    locals
        .iter()
        .map(|(_, local)| {
            match local.id.as_deref().and_then(|id| by_remote_id.get(id)) {
                Some(remote) => {
                    if normalize::equal(local, remote) {
                        ImportAction::Skip
                    } else {
                        ImportAction::Update {
                            id: local.id.clone().unwrap_or_default(),
                        }
                    }
                }
                None => ImportAction::Create {
                    old_id: local.id.clone(),
                },
            }
        })
        .collect()
}

/// Pick the remote definition a same-named import should target
///
/// Duplicate names are legal on the service; the tie-break is deterministic -
/// latest `updatedAt` wins, missing timestamps sort oldest - and every
/// candidate is named in the warning so the collision can be cleaned up.
fn latest_by_name<'a>(
    inventory: &'a [WorkflowDefinition],
    name: &str,
) -> Option<&'a WorkflowDefinition> {
    let mut candidates: Vec<&WorkflowDefinition> = inventory
        .iter()
        .filter(|d| d.name == name && !d.archived())
        .collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|a, b| (a.updated_at, a.id.as_deref()).cmp(&(b.updated_at, b.id.as_deref())));

    if candidates.len() > 1 {
        let listing: Vec<String> = candidates
            .iter()
            .map(|d| {
                format!(
                    "{} (updated {})",
                    d.id.as_deref().unwrap_or("?"),
                    d.updated_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string())
                )
            })
            .collect();
        tracing::warn!(
            "Multiple remote workflows named '{}'; targeting the most recently updated of [{}]",
            name,
            listing.join(", ")
        );
    }
    candidates.last().copied()
}

/// Run a full restore pass against the remote API
///
/// Returns `None` when the user declines the confirmation gate.
pub async fn run_restore(
    client: &RemoteClient,
    options: &RestoreOptions,
) -> Result<Option<RestoreSummary>> {
    let locals = snapshot::read_tree(&options.input_dir)?;
    tracing::info!(
        "📤 Read {} workflows from '{}'",
        locals.len(),
        options.input_dir.display()
    );

    tracing::info!("📥 Enumerating the remote workflow inventory");
    let inventory = client.list().await?;
    let by_remote_id: HashMap<&str, &WorkflowDefinition> = inventory
        .iter()
        .filter_map(|d| d.id.as_deref().map(|id| (id, d)))
        .collect();

    let plan = plan_imports(&locals, &by_remote_id);
    let writes = plan.iter().filter(|a| **a != ImportAction::Skip).count();
    let mut summary = RestoreSummary {
        skipped: plan.len() - writes,
        ..RestoreSummary::default()
    };
    if writes == 0 {
        tracing::info!("✅ Everything up to date - nothing to import");
        return Ok(Some(summary));
    }

    // Connectivity gate: abort the whole run before any write rather than
    // leaving a partial import behind
    client.ping().await?;

    let question = format!(
        "Import {} of {} workflows into the remote service?",
        writes,
        plan.len()
    );
    if !confirm(&question, options.assume_yes)? {
        tracing::info!("Restore cancelled; nothing was written");
        return Ok(None);
    }

    // References are resolved against the full local batch so forward
    // references to siblings imported later in this run still resolve
    let universe_set: Vec<_> = locals.iter().map(|(_, d)| d.clone()).collect();
    let universe = Universe::new(&universe_set);
    let mut context = SyncContext::new();
    let mut report = SyncReport::default();

    for ((path, local), action) in locals.iter().zip(plan) {
        if action == ImportAction::Skip {
            tracing::debug!("Unchanged: '{}'", local.name);
            continue;
        }

        let mut outgoing = local.clone();
        resolver::to_name_based(&mut outgoing, &universe, &mut report);

        let result = match action {
            ImportAction::Skip => unreachable!("skips are filtered above"),
            ImportAction::Update { id } => {
                match client.update(&id, &outgoing).await.map_err(|e| {
                    anyhow::anyhow!("Failed to update '{}' ({}): {}", outgoing.name, id, e)
                })? {
                    Some(_) => {
                        summary.updated += 1;
                        Ok(())
                    }
                    // Deleted remotely between enumeration and write: recreate
                    None => import_by_name(client, &inventory, &mut context, &outgoing, Some(&id), &mut summary).await,
                }
            }
            ImportAction::Create { old_id } => {
                import_by_name(
                    client,
                    &inventory,
                    &mut context,
                    &outgoing,
                    old_id.as_deref(),
                    &mut summary,
                )
                .await
            }
        };
        result.map_err(|e| anyhow::anyhow!("Failed to import '{}': {}", path.display(), e))?;
    }

    repair_references(client, &context, &mut summary).await?;

    summary.references_fixed += report.fixed;
    summary.references_unresolved += report.not_found;
    for unresolved in &report.unresolved {
        tracing::warn!(
            "Unresolved reference in '{}' / '{}': target '{}' was not found",
            unresolved.definition_name,
            unresolved.node_name,
            unresolved.value
        );
    }

    tracing::info!(
        "✅ Restore complete: {} created, {} updated, {} skipped, {} repaired",
        summary.created,
        summary.updated,
        summary.skipped,
        summary.repaired
    );
    Ok(Some(summary))
}

/// Import a definition whose remote identity must be re-established by name
///
/// The stale id never reaches the service - create bodies are stripped - and
/// whatever id the definition ends up under is recorded for the repair pass.
async fn import_by_name(
    client: &RemoteClient,
    inventory: &[WorkflowDefinition],
    context: &mut SyncContext,
    outgoing: &WorkflowDefinition,
    old_id: Option<&str>,
    summary: &mut RestoreSummary,
) -> Result<()> {
    // A same-named sibling already created in this run adopts the import
    // instead of a second create - the per-name lock in action
    if let Some(existing_id) = context.created_id(&outgoing.name).map(str::to_string) {
        tracing::warn!(
            "Duplicate name '{}' in the local batch; updating the workflow created earlier this run",
            outgoing.name
        );
        if client.update(&existing_id, outgoing).await?.is_some() {
            if let Some(old) = old_id {
                context.record_id_change(old, &existing_id);
            }
            summary.updated += 1;
            return Ok(());
        }
    }

    // An existing remote definition with the same name is updated in place
    if let Some(existing) = latest_by_name(inventory, &outgoing.name) {
        if let Some(existing_id) = existing.id.as_deref() {
            if client.update(existing_id, outgoing).await?.is_some() {
                if let Some(old) = old_id {
                    context.record_id_change(old, existing_id);
                }
                summary.updated += 1;
                return Ok(());
            }
        }
    }

    context.claim_name(&outgoing.name);
    let created = client.create(outgoing).await?;
    let Some(new_id) = created.id.as_deref() else {
        return Err(anyhow::anyhow!(
            "The service created '{}' but returned no id",
            outgoing.name
        ));
    };
    tracing::info!("Created '{}' as {}", outgoing.name, new_id);
    context.record_creation(&outgoing.name, new_id);
    if let Some(old) = old_id {
        context.record_id_change(old, new_id);
    }
    summary.created += 1;
    Ok(())
}

/// Rewrite references to current ids across the whole remote inventory
///
/// Runs over every remote definition, not just the imported subset: older
/// definitions may still point at ids that this run just replaced. Only
/// definitions whose serialized form actually changed are written back.
async fn repair_references(
    client: &RemoteClient,
    context: &SyncContext,
    summary: &mut RestoreSummary,
) -> Result<()> {
    tracing::info!("🔗 Repairing cross-workflow references across the remote inventory");
    let current = client.list().await?;
    let universe_set: Vec<_> = current.iter().filter(|d| !d.archived()).cloned().collect();
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    for mut definition in current {
        if definition.archived() {
            continue;
        }
        let changes =
            resolver::to_id_based(&mut definition, context.id_mapping(), &universe, &mut report);
        if changes == 0 {
            continue;
        }
        let Some(id) = definition.id.clone() else {
            continue;
        };
        match client.update(&id, &definition).await.map_err(|e| {
            anyhow::anyhow!("Failed to write repaired '{}' ({}): {}", definition.name, id, e)
        })? {
            Some(_) => summary.repaired += 1,
            None => tracing::warn!(
                "Workflow '{}' disappeared during the repair pass",
                definition.name
            ),
        }
    }

    summary.references_fixed += report.fixed;
    summary.references_unresolved += report.not_found;
    for unresolved in &report.unresolved {
        tracing::warn!(
            "Unresolved reference in '{}' / '{}': target '{}' was not found",
            unresolved.definition_name,
            unresolved.node_name,
            unresolved.value
        );
    }
    Ok(())
}

/// Restore straight into the service's backing store, preserving ids
///
/// Only legal while the service is stopped - the importer refuses to touch a
/// live database. Because ids survive this path, references are rewritten to
/// id form against the batch itself before writing.
pub async fn run_direct_restore(
    db_path: &str,
    options: &RestoreOptions,
) -> Result<Option<DirectImportSummary>> {
    let entries = snapshot::read_tree(&options.input_dir)?;
    let mut definitions: Vec<_> = entries.into_iter().map(|(_, d)| d).collect();
    tracing::info!(
        "📤 Read {} workflows from '{}'",
        definitions.len(),
        options.input_dir.display()
    );

    let universe_set = definitions.clone();
    let universe = Universe::new(&universe_set);
    let no_mapping = HashMap::new();
    let mut report = SyncReport::default();
    for definition in &mut definitions {
        resolver::to_id_based(definition, &no_mapping, &universe, &mut report);
    }
    for unresolved in &report.unresolved {
        tracing::warn!(
            "Unresolved reference in '{}' / '{}': target '{}' was not found",
            unresolved.definition_name,
            unresolved.node_name,
            unresolved.value
        );
    }

    let question = format!(
        "Write {} workflows directly into '{}' (service must be stopped)?",
        definitions.len(),
        db_path
    );
    if !confirm(&question, options.assume_yes)? {
        tracing::info!("Direct restore cancelled; nothing was written");
        return Ok(None);
    }

    let summary = storage::import_preserving_ids(db_path, &definitions).await?;
    tracing::info!(
        "✅ Direct restore complete: {} imported, {} skipped",
        summary.imported,
        summary.skipped
    );
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn definition(id: Option<&str>, name: &str) -> WorkflowDefinition {
        WorkflowDefinition {
            id: id.map(str::to_string),
            name: name.to_string(),
            nodes: Vec::new(),
            connections: json!({}),
            settings: None,
            static_data: None,
            tags: Vec::new(),
            active: false,
            is_archived: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    fn entry(id: Option<&str>, name: &str) -> (PathBuf, WorkflowDefinition) {
        (PathBuf::from(format!("{}.json", name)), definition(id, name))
    }

    #[test]
    fn unchanged_definitions_are_skipped_and_dead_ids_are_recreated() {
        let live_same = definition(Some("w1"), "Same");
        let live_changed = {
            let mut d = definition(Some("w2"), "Changed");
            d.settings = Some(json!({ "timezone": "UTC" }));
            d
        };
        let inventory = [live_same, live_changed];
        let by_remote_id: HashMap<&str, &WorkflowDefinition> = inventory
            .iter()
            .filter_map(|d| d.id.as_deref().map(|id| (id, d)))
            .collect();

        let locals = vec![
            entry(Some("w1"), "Same"),
            entry(Some("w2"), "Changed"),
            entry(Some("w-dead"), "Deleted remotely"),
            entry(None, "Brand new"),
        ];
        let plan = plan_imports(&locals, &by_remote_id);

        assert_eq!(plan[0], ImportAction::Skip);
        assert_eq!(
            plan[1],
            ImportAction::Update {
                id: "w2".to_string()
            }
        );
        assert_eq!(
            plan[2],
            ImportAction::Create {
                old_id: Some("w-dead".to_string())
            }
        );
        assert_eq!(plan[3], ImportAction::Create { old_id: None });
    }

    #[test]
    fn duplicate_names_resolve_to_the_latest_updated() {
        let mut older = definition(Some("x1"), "X");
        older.updated_at = Some("2026-01-01T00:00:00Z".parse().unwrap());
        let mut newer = definition(Some("x2"), "X");
        newer.updated_at = Some("2026-02-01T00:00:00Z".parse().unwrap());
        let inventory = [older, newer];

        let picked = latest_by_name(&inventory, "X").unwrap();
        assert_eq!(picked.id.as_deref(), Some("x2"));
    }

    #[test]
    fn archived_candidates_are_never_adopted() {
        let mut archived = definition(Some("x1"), "X");
        archived.is_archived = Some(true);
        archived.updated_at = Some("2026-02-01T00:00:00Z".parse().unwrap());
        let inventory = [archived];

        assert!(latest_by_name(&inventory, "X").is_none());
    }

    #[test]
    fn candidates_without_timestamps_sort_oldest() {
        let untimed = definition(Some("x1"), "X");
        let mut timed = definition(Some("x2"), "X");
        timed.updated_at = Some("2026-01-01T00:00:00Z".parse().unwrap());
        let inventory = [untimed, timed];

        let picked = latest_by_name(&inventory, "X").unwrap();
        assert_eq!(picked.id.as_deref(), Some("x2"));
    }
}
