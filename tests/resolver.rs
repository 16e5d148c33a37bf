//! Reference resolution: name<->id rewrites, the matcher strategy order, and
//! the reporting contract for unresolved targets.
mod common;
use common::{definition, definition_with_reference, first_reference, id_reference, name_reference};
use flowvault::resolver::{to_id_based, to_name_based, SyncReport, Universe};
use flowvault::workflow::ReferenceMode;
use std::collections::HashMap;

#[test]
fn id_mode_reference_is_rewritten_to_name_form() {
    let target = definition(Some("b2"), "Cleanup");
    let mut caller =
        definition_with_reference(Some("a1"), "Main", "Call cleanup", id_reference("b2", None));
    let universe_set = vec![target];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    let changed = to_name_based(&mut caller, &universe, &mut report);

    assert_eq!(changed, 1);
    assert_eq!(report.fixed, 1);
    let reference = first_reference(&caller);
    assert_eq!(reference.mode, ReferenceMode::List);
    assert_eq!(reference.value, "Cleanup");
    assert_eq!(reference.cached_result_name.as_deref(), Some("Cleanup"));
    assert_eq!(reference.cached_result_url, None);
}

#[test]
fn stale_id_falls_back_to_cached_name() {
    // The id is dead but the display hint still names a live definition
    let target = definition(Some("b2"), "Cleanup");
    let mut caller = definition_with_reference(
        Some("a1"),
        "Main",
        "Call cleanup",
        id_reference("b1-stale", Some("Cleanup")),
    );
    let universe_set = vec![target];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    to_id_based(&mut caller, &HashMap::new(), &universe, &mut report);

    let reference = first_reference(&caller);
    assert_eq!(reference.mode, ReferenceMode::Id);
    assert_eq!(reference.value, "b2");
    assert_eq!(reference.cached_result_name.as_deref(), Some("Cleanup"));
    assert_eq!(reference.cached_result_url.as_deref(), Some("/workflow/b2"));
    assert_eq!(report.fixed, 1);
    assert_eq!(report.not_found, 0);
}

#[test]
fn cached_name_matches_through_tags_and_case() {
    let target = definition(Some("b2"), "[Billing] Send Invoice");
    let mut caller = definition_with_reference(
        Some("a1"),
        "Main",
        "Call billing",
        id_reference("dead", Some("send invoice")),
    );
    let universe_set = vec![target];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    to_id_based(&mut caller, &HashMap::new(), &universe, &mut report);

    assert_eq!(first_reference(&caller).value, "b2");
    assert_eq!(report.fixed, 1);
}

#[test]
fn exact_id_match_wins_over_name_hints() {
    // A live id must not be "repaired" onto a different same-named target
    let by_id = definition(Some("b1"), "Cleanup Old");
    let by_name = definition(Some("b2"), "Cleanup");
    let mut caller = definition_with_reference(
        Some("a1"),
        "Main",
        "Call cleanup",
        id_reference("b1", Some("Cleanup")),
    );
    let universe_set = vec![by_id, by_name];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    to_id_based(&mut caller, &HashMap::new(), &universe, &mut report);

    let reference = first_reference(&caller);
    assert_eq!(reference.value, "b1");
    assert_eq!(reference.cached_result_name.as_deref(), Some("Cleanup Old"));
}

#[test]
fn id_mapping_is_consulted_before_name_matching() {
    // The target was recreated this run: old id dead, new id live, and a
    // decoy with the cached name must lose to the mapping
    let recreated = definition(Some("b-new"), "Cleanup v2");
    let decoy = definition(Some("b-decoy"), "Cleanup");
    let mut caller = definition_with_reference(
        Some("a1"),
        "Main",
        "Call cleanup",
        id_reference("b-old", Some("Cleanup")),
    );
    let universe_set = vec![recreated, decoy];
    let universe = Universe::new(&universe_set);
    let mut mapping = HashMap::new();
    mapping.insert("b-old".to_string(), "b-new".to_string());

    let mut report = SyncReport::default();
    to_id_based(&mut caller, &mapping, &universe, &mut report);

    let reference = first_reference(&caller);
    assert_eq!(reference.value, "b-new");
    assert_eq!(reference.cached_result_name.as_deref(), Some("Cleanup v2"));
}

#[test]
fn unresolved_reference_is_reported_and_left_unchanged() {
    let unrelated = definition(Some("x1"), "Unrelated");
    let mut caller = definition_with_reference(
        Some("a1"),
        "Main",
        "Call ghost",
        id_reference("dead", Some("Ghost")),
    );
    let universe_set = vec![unrelated];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    let changed = to_name_based(&mut caller, &universe, &mut report);

    assert_eq!(changed, 0);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].definition_name, "Main");
    assert_eq!(report.unresolved[0].node_name, "Call ghost");
    assert_eq!(report.unresolved[0].value, "dead");

    let reference = first_reference(&caller);
    assert_eq!(reference.mode, ReferenceMode::Id);
    assert_eq!(reference.value, "dead");
}

#[test]
fn mixed_mode_drift_is_not_coerced() {
    // An id-mode reference with a *name* stored in its value: the value is
    // never tried as a name, so this surfaces as unresolved
    let target = definition(Some("b2"), "Cleanup");
    let mut caller = definition_with_reference(
        Some("a1"),
        "Main",
        "Call cleanup",
        serde_json::json!({ "mode": "id", "value": "Cleanup" }),
    );
    let universe_set = vec![target];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    to_id_based(&mut caller, &HashMap::new(), &universe, &mut report);

    assert_eq!(report.not_found, 1);
    assert_eq!(first_reference(&caller).value, "Cleanup");
}

#[test]
fn round_trip_lands_on_the_recreated_id() {
    // Local A references B by its old id b1; remotely B now lives under b2.
    // Name-based rewrite against the local set, then id-based repair against
    // the remote set, must land on b2 with the name hint refreshed.
    let local_b = definition(Some("b1"), "B");
    let mut a = definition_with_reference(Some("a1"), "A", "Call B", id_reference("b1", None));

    let local_set = vec![local_b];
    let local_universe = Universe::new(&local_set);
    let mut report = SyncReport::default();
    to_name_based(&mut a, &local_universe, &mut report);
    assert_eq!(first_reference(&a).value, "B");

    let remote_b = definition(Some("b2"), "B");
    let remote_set = vec![remote_b];
    let remote_universe = Universe::new(&remote_set);
    to_id_based(&mut a, &HashMap::new(), &remote_universe, &mut report);

    let reference = first_reference(&a);
    assert_eq!(reference.mode, ReferenceMode::Id);
    assert_eq!(reference.value, "b2");
    assert_eq!(reference.cached_result_name.as_deref(), Some("B"));
}

#[test]
fn repair_pass_is_idempotent() {
    let target = definition(Some("b2"), "Cleanup");
    let mut caller =
        definition_with_reference(Some("a1"), "Main", "Call cleanup", name_reference("Cleanup"));
    let universe_set = vec![target];
    let universe = Universe::new(&universe_set);

    let mut report = SyncReport::default();
    let first = to_id_based(&mut caller, &HashMap::new(), &universe, &mut report);
    let second = to_id_based(&mut caller, &HashMap::new(), &universe, &mut report);

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(report.unchanged, 1);
}
