/// Cross-workflow reference resolver
///
/// Rewrites embedded cross-workflow pointers between name-based and id-based
/// form against a caller-supplied universe of candidate definitions. Matching
/// policy is a declarative ordered strategy list; the first strategy that
/// produces a hit wins, and a reference whose target cannot be found is left
/// untouched and reported, never silently dropped or coerced.

use crate::workflow::names::normalize_title;
use crate::workflow::types::{CrossWorkflowReference, ReferenceMode, WorkflowDefinition};
use std::collections::HashMap;

/// Indexed view over a set of candidate definitions
///
/// Built once per resolution pass from either the full remote inventory or the
/// full local batch. On name collisions the first definition in slice order
/// wins, so callers control tie-breaking through their enumeration order.
pub struct Universe<'a> {
    by_id: HashMap<&'a str, &'a WorkflowDefinition>,
    by_name: HashMap<&'a str, &'a WorkflowDefinition>,
    by_normalized: HashMap<String, &'a WorkflowDefinition>,
}

impl<'a> Universe<'a> {
    /// Index the given definitions for reference lookup
    pub fn new(definitions: &'a [WorkflowDefinition]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_normalized = HashMap::new();

        for definition in definitions {
            if let Some(id) = definition.id.as_deref() {
                by_id.entry(id).or_insert(definition);
            }
            by_name
                .entry(definition.name.as_str())
                .or_insert(definition);
            by_normalized
                .entry(normalize_title(&definition.name))
                .or_insert(definition);
        }

        Self {
            by_id,
            by_name,
            by_normalized,
        }
    }

    /// Look up a definition by its current service id
    pub fn find_by_id(&self, id: &str) -> Option<&'a WorkflowDefinition> {
        self.by_id.get(id).copied()
    }

    /// Look up a definition by exact name
    pub fn find_by_name(&self, name: &str) -> Option<&'a WorkflowDefinition> {
        self.by_name.get(name).copied()
    }

    /// Look up a definition by normalized title
    pub fn find_by_normalized(&self, name: &str) -> Option<&'a WorkflowDefinition> {
        self.by_normalized.get(&normalize_title(name)).copied()
    }
}

/// A single matching strategy in the resolution chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// The reference value interpreted as a service id (id mode only)
    ExactId,
    /// The best-known display name, matched exactly
    ExactName,
    /// The best-known display name, matched in normalized form
    NormalizedName,
}

/// Resolution order: tightest match first, first non-empty result wins
pub const MATCH_ORDER: &[MatchStrategy] = &[
    MatchStrategy::ExactId,
    MatchStrategy::ExactName,
    MatchStrategy::NormalizedName,
];

impl MatchStrategy {
    fn apply<'a>(
        &self,
        reference: &CrossWorkflowReference,
        universe: &Universe<'a>,
    ) -> Option<&'a WorkflowDefinition> {
        match self {
            MatchStrategy::ExactId => match reference.mode {
                ReferenceMode::Id => universe.find_by_id(&reference.value),
                ReferenceMode::List => None,
            },
            MatchStrategy::ExactName => {
                candidate_name(reference).and_then(|name| universe.find_by_name(name))
            }
            MatchStrategy::NormalizedName => {
                candidate_name(reference).and_then(|name| universe.find_by_normalized(name))
            }
        }
    }
}

/// The name a reference is allowed to be matched on
///
/// In list mode the value itself is the name. In id mode only the cached
/// display name qualifies: a name accidentally stored in an id-mode `value`
/// (mixed-mode drift) is deliberately not tried, so such references surface
/// as unresolved instead of being coerced.
fn candidate_name(reference: &CrossWorkflowReference) -> Option<&str> {
    match reference.mode {
        ReferenceMode::List => Some(reference.value.as_str()),
        ReferenceMode::Id => reference.cached_result_name.as_deref(),
    }
}

/// Resolve a reference against the universe
///
/// The import run's `oldId -> newId` mapping, when supplied, is consulted
/// before any strategy so that references to definitions recreated earlier in
/// the same batch land on their final ids.
pub fn resolve_reference<'a>(
    reference: &CrossWorkflowReference,
    id_mapping: Option<&HashMap<String, String>>,
    universe: &Universe<'a>,
) -> Option<&'a WorkflowDefinition> {
    if reference.mode == ReferenceMode::Id {
        if let Some(new_id) = id_mapping.and_then(|mapping| mapping.get(&reference.value)) {
            if let Some(target) = universe.find_by_id(new_id) {
                return Some(target);
            }
        }
    }

    MATCH_ORDER
        .iter()
        .find_map(|strategy| strategy.apply(reference, universe))
}

/// One rewritten reference, for the run's audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFix {
    pub definition_name: String,
    pub node_name: String,
    pub target_name: String,
    pub old_value: String,
    pub new_value: String,
}

/// One reference whose target is absent from the universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub definition_name: String,
    pub node_name: String,
    pub value: String,
}

/// Counters and audit rows accumulated over a resolution pass
#[derive(Debug, Default)]
pub struct SyncReport {
    /// References rewritten to a new value
    pub fixed: usize,
    /// References whose target was not found; left unchanged
    pub not_found: usize,
    /// References already pointing at the right place
    pub unchanged: usize,
    /// Audit rows for every rewrite
    pub fixes: Vec<ReferenceFix>,
    /// Every reference left unresolved, for the run summary
    pub unresolved: Vec<UnresolvedReference>,
}

impl SyncReport {
    fn record_fix(
        &mut self,
        definition: &WorkflowDefinition,
        node_name: &str,
        target_name: &str,
        old_value: &str,
        new_value: &str,
    ) {
        self.fixed += 1;
        self.fixes.push(ReferenceFix {
            definition_name: definition.name.clone(),
            node_name: node_name.to_string(),
            target_name: target_name.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
        });
    }

    fn record_unresolved(&mut self, definition: &WorkflowDefinition, node_name: &str, value: &str) {
        self.not_found += 1;
        self.unresolved.push(UnresolvedReference {
            definition_name: definition.name.clone(),
            node_name: node_name.to_string(),
            value: value.to_string(),
        });
    }
}

/// Rewrite every id-mode reference in the definition to name-based form
///
/// Run before any remote write: a name-based reference survives whatever the
/// service does to ids on that particular call, which is what makes the write
/// path idempotent. Returns the number of nodes actually modified.
pub fn to_name_based(
    definition: &mut WorkflowDefinition,
    universe: &Universe<'_>,
    report: &mut SyncReport,
) -> usize {
    let mut changed = 0;

    for index in 0..definition.nodes.len() {
        let Some(reference) = definition.nodes[index].cross_reference() else {
            continue;
        };
        let node_name = definition.nodes[index].name.clone();

        match reference.mode {
            ReferenceMode::List => {
                report.unchanged += 1;
            }
            ReferenceMode::Id => match resolve_reference(&reference, None, universe) {
                Some(target) => {
                    let rewritten = reference.to_target_by_name(&target.name);
                    if rewritten == reference {
                        report.unchanged += 1;
                    } else {
                        tracing::debug!(
                            "Rewriting reference in '{}' / '{}': id '{}' -> name '{}'",
                            definition.name,
                            node_name,
                            reference.value,
                            target.name
                        );
                        report.record_fix(
                            definition,
                            &node_name,
                            &target.name,
                            &reference.value,
                            &rewritten.value,
                        );
                        definition.nodes[index].set_cross_reference(&rewritten);
                        changed += 1;
                    }
                }
                None => {
                    report.record_unresolved(definition, &node_name, &reference.value);
                }
            },
        }
    }

    changed
}

/// Rewrite every reference in the definition to id-based form
///
/// Run only in the post-import repair pass, once the whole batch has landed
/// and the id set is final. The run's `oldId -> newId` mapping takes priority
/// over name matching; cache hints are always refreshed from the resolved
/// target. Returns the number of nodes actually modified.
pub fn to_id_based(
    definition: &mut WorkflowDefinition,
    id_mapping: &HashMap<String, String>,
    universe: &Universe<'_>,
    report: &mut SyncReport,
) -> usize {
    let mut changed = 0;

    for index in 0..definition.nodes.len() {
        let Some(reference) = definition.nodes[index].cross_reference() else {
            continue;
        };
        let node_name = definition.nodes[index].name.clone();

        match resolve_reference(&reference, Some(id_mapping), universe) {
            Some(target) => {
                let Some(target_id) = target.id.as_deref() else {
                    report.record_unresolved(definition, &node_name, &reference.value);
                    continue;
                };
                let rewritten = reference.to_target_by_id(target_id, &target.name);
                if rewritten == reference {
                    report.unchanged += 1;
                } else {
                    tracing::debug!(
                        "Repairing reference in '{}' / '{}': '{}' -> id '{}' ({})",
                        definition.name,
                        node_name,
                        reference.value,
                        target_id,
                        target.name
                    );
                    report.record_fix(
                        definition,
                        &node_name,
                        &target.name,
                        &reference.value,
                        &rewritten.value,
                    );
                    definition.nodes[index].set_cross_reference(&rewritten);
                    changed += 1;
                }
            }
            None => {
                report.record_unresolved(definition, &node_name, &reference.value);
            }
        }
    }

    changed
}
