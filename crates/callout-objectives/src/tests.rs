//! Tests for the objective accounting engine.

use callout_core::enums::ObjectiveKind;

use crate::{ObjectiveIds, ObjectiveList};

const RESCUE_ALL: u32 = 1;
const NO_DEATHS: u32 = 2;
const BONUS_SPEED: u32 = 3;

fn list_with(
    ids: &mut ObjectiveIds,
    entries: &[(u32, ObjectiveKind, u32)],
) -> ObjectiveList {
    let mut list = ObjectiveList::new();
    for &(type_id, kind, priority) in entries {
        list.get_or_create(type_id, kind, 1, priority, ids);
    }
    list
}

// ---- Accomplishment ----

#[test]
fn zero_need_objective_is_accomplished() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    for kind in [
        ObjectiveKind::Required,
        ObjectiveKind::Optional,
    ] {
        let obj = list.get_or_create(kind as u32 + 10, kind, 1, 100, &mut ids);
        assert!(
            obj.check_accomplished(),
            "{kind:?} with needed == 0 should be accomplished"
        );
    }
}

#[test]
fn zero_need_fail_condition_never_triggers() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    let obj = list.get_or_create(NO_DEATHS, ObjectiveKind::FailCondition, 1, 100, &mut ids);
    assert!(!obj.check_accomplished());
    assert!(!list.check_failure());
}

#[test]
fn optional_failed_is_never_accomplished() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    let obj = list.get_or_create(BONUS_SPEED, ObjectiveKind::OptionalFailed, 1, 100, &mut ids);
    obj.set_needed_number(1);
    obj.set_current_number(5);
    assert!(!obj.check_accomplished());
}

#[test]
fn accomplished_once_current_reaches_needed() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    let obj = list.get_or_create(RESCUE_ALL, ObjectiveKind::Required, 1, 100, &mut ids);
    obj.set_needed_number(3);
    assert!(!obj.check_accomplished());
    obj.increase_current_number(None);
    obj.increase_current_number(None);
    assert!(!obj.check_accomplished());
    obj.increase_current_number(None);
    assert!(obj.check_accomplished());
}

// ---- Entity association ----

#[test]
fn increase_with_same_entity_twice_is_idempotent() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    let obj = list.get_or_create(RESCUE_ALL, ObjectiveKind::Required, 1, 100, &mut ids);
    obj.set_needed_number(2);

    obj.increase_current_number(Some(42));
    obj.increase_current_number(Some(42));
    assert_eq!(obj.current_entities.len(), 1);
    assert_eq!(obj.current_number, 1);

    obj.increase_current_number(Some(43));
    assert_eq!(obj.current_entities.len(), 2);
    assert!(obj.check_accomplished());
}

#[test]
fn decrease_with_unknown_entity_is_noop() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    let obj = list.get_or_create(RESCUE_ALL, ObjectiveKind::Required, 1, 100, &mut ids);
    obj.increase_current_number(Some(42));
    obj.decrease_current_number(Some(99));
    assert_eq!(obj.current_number, 1);
    obj.decrease_current_number(Some(42));
    assert_eq!(obj.current_number, 0);
    assert!(obj.current_entities.is_empty());
}

// ---- Unique type ID ----

#[test]
fn get_or_create_returns_existing_record() {
    let mut ids = ObjectiveIds::default();
    let mut list = ObjectiveList::new();
    let first_id = list
        .get_or_create(RESCUE_ALL, ObjectiveKind::Required, 1, 100, &mut ids)
        .id;
    let second_id = list
        .get_or_create(RESCUE_ALL, ObjectiveKind::Required, 1, 100, &mut ids)
        .id;
    assert_eq!(first_id, second_id);
    assert_eq!(list.len(), 1);
}

#[test]
fn instance_ids_are_unique_across_lists() {
    let mut ids = ObjectiveIds::default();
    let mut a = ObjectiveList::new();
    let mut b = ObjectiveList::new();
    let id_a = a
        .get_or_create(RESCUE_ALL, ObjectiveKind::Required, 1, 100, &mut ids)
        .id;
    let id_b = b
        .get_or_create(RESCUE_ALL, ObjectiveKind::Required, 2, 100, &mut ids)
        .id;
    assert_ne!(id_a, id_b);
}

// ---- Deterministic ordering ----

#[test]
fn sorted_orders_by_priority_then_type_id() {
    let mut ids = ObjectiveIds::default();
    // A=5 priority 50, B=6 priority 10, C=7 priority 10, with B < C.
    let list = list_with(
        &mut ids,
        &[
            (5, ObjectiveKind::Required, 50),
            (7, ObjectiveKind::Required, 10),
            (6, ObjectiveKind::Required, 10),
        ],
    );
    let order: Vec<u32> = list.sorted().iter().map(|o| o.type_id).collect();
    assert_eq!(order, vec![6, 7, 5]);
}

// ---- Success / failure evaluation ----

#[test]
fn success_requires_all_required_and_no_fail() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 100),
            (NO_DEATHS, ObjectiveKind::FailCondition, 100),
        ],
    );
    list.get_mut(RESCUE_ALL).unwrap().set_needed_number(1);

    assert!(!list.check_success());
    list.get_mut(RESCUE_ALL).unwrap().increase_current_number(None);
    assert!(list.check_success());
    assert!(!list.check_failure());
}

/// Success and failure can be simultaneously "true" at the record level;
/// the list reports failure and withholds success.
#[test]
fn triggered_fail_condition_vetoes_success() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 100),
            (NO_DEATHS, ObjectiveKind::FailCondition, 100),
        ],
    );
    list.get_mut(RESCUE_ALL).unwrap().set_needed_number(1);
    list.get_mut(RESCUE_ALL).unwrap().increase_current_number(None);
    let fail = list.get_mut(NO_DEATHS).unwrap();
    fail.set_needed_number(1);
    fail.increase_current_number(None);

    assert!(list.check_failure());
    assert!(!list.check_success());
}

#[test]
fn optional_objectives_do_not_gate_success() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 100),
            (BONUS_SPEED, ObjectiveKind::Optional, 100),
        ],
    );
    list.get_mut(BONUS_SPEED).unwrap().set_needed_number(10);
    assert!(list.check_success());
}

// ---- List operations ----

#[test]
fn swap_exchanges_record_sets() {
    let mut ids = ObjectiveIds::default();
    let mut a = list_with(&mut ids, &[(RESCUE_ALL, ObjectiveKind::Required, 100)]);
    let mut b = list_with(
        &mut ids,
        &[
            (NO_DEATHS, ObjectiveKind::FailCondition, 100),
            (BONUS_SPEED, ObjectiveKind::Optional, 100),
        ],
    );
    a.swap_with(&mut b);
    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 1);
    assert!(a.get(NO_DEATHS).is_some());
    assert!(b.get(RESCUE_ALL).is_some());
}

#[test]
fn remove_is_noop_when_absent() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(&mut ids, &[(RESCUE_ALL, ObjectiveKind::Required, 100)]);
    list.remove(999);
    assert_eq!(list.len(), 1);
    list.remove(RESCUE_ALL);
    assert!(list.is_empty());
}

#[test]
fn count_of_kind() {
    let mut ids = ObjectiveIds::default();
    let list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 100),
            (NO_DEATHS, ObjectiveKind::FailCondition, 100),
            (BONUS_SPEED, ObjectiveKind::Optional, 100),
        ],
    );
    assert_eq!(list.count_of_kind(ObjectiveKind::Required), 1);
    assert_eq!(list.count_of_kind(ObjectiveKind::FailCondition), 1);
    assert_eq!(list.count_of_kind(ObjectiveKind::OptionalFailed), 0);
}

// ---- Progress drain ----

#[test]
fn drain_progress_reports_each_mutation_once() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 100),
            (NO_DEATHS, ObjectiveKind::FailCondition, 100),
        ],
    );
    assert!(list.drain_progress().is_empty(), "creation is not progress");

    list.get_mut(RESCUE_ALL).unwrap().set_needed_number(3);
    list.get_mut(RESCUE_ALL).unwrap().increase_current_number(None);
    assert_eq!(list.drain_progress(), vec![RESCUE_ALL]);
    assert!(list.drain_progress().is_empty());
}

#[test]
fn drain_progress_collects_every_touched_record() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 100),
            (NO_DEATHS, ObjectiveKind::FailCondition, 100),
            (BONUS_SPEED, ObjectiveKind::Optional, 100),
        ],
    );
    list.get_mut(RESCUE_ALL).unwrap().increase_current_number(None);
    list.get_mut(BONUS_SPEED).unwrap().set_needed_number(2);
    assert_eq!(list.drain_progress(), vec![RESCUE_ALL, BONUS_SPEED]);
}

#[test]
fn set_accomplished_marks_progress() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(&mut ids, &[(RESCUE_ALL, ObjectiveKind::Required, 100)]);
    let obj = list.get_mut(RESCUE_ALL).unwrap();
    obj.set_needed_number(5);
    list.drain_progress();

    let obj = list.get_mut(RESCUE_ALL).unwrap();
    obj.set_accomplished();
    assert!(obj.check_accomplished());
    assert_eq!(list.drain_progress(), vec![RESCUE_ALL]);
}

// ---- Stale reference recovery ----

#[test]
fn fulfills_needed_entities_that_no_longer_exist() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(&mut ids, &[(RESCUE_ALL, ObjectiveKind::Required, 100)]);
    let obj = list.get_mut(RESCUE_ALL).unwrap();
    obj.increase_needed_number(Some(10));
    obj.increase_needed_number(Some(11));
    obj.increase_needed_number(Some(12));
    obj.increase_current_number(Some(10));
    assert!(!obj.check_accomplished());

    // Entities 11 and 12 are gone from the world.
    list.fulfill_nonexisting_needed_entities(|id| id == 10);
    let obj = list.get(RESCUE_ALL).unwrap();
    assert_eq!(obj.current_number, 3);
    assert!(obj.check_accomplished());
}

#[test]
fn fulfill_does_not_double_count_already_fulfilled() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(&mut ids, &[(RESCUE_ALL, ObjectiveKind::Required, 100)]);
    let obj = list.get_mut(RESCUE_ALL).unwrap();
    obj.increase_needed_number(Some(10));
    obj.increase_current_number(Some(10));

    // Entity 10 is dead but already counted; nothing to recover.
    list.fulfill_nonexisting_needed_entities(|_| false);
    let obj = list.get(RESCUE_ALL).unwrap();
    assert_eq!(obj.current_number, 1);
}

// ---- Serde (save contract) ----

#[test]
fn objective_list_roundtrips_through_json() {
    let mut ids = ObjectiveIds::default();
    let mut list = list_with(
        &mut ids,
        &[
            (RESCUE_ALL, ObjectiveKind::Required, 10),
            (NO_DEATHS, ObjectiveKind::FailCondition, 20),
        ],
    );
    let obj = list.get_mut(RESCUE_ALL).unwrap();
    obj.set_needed_number(3);
    obj.increase_current_number(Some(7));

    let json = serde_json::to_string(&list).unwrap();
    let back: ObjectiveList = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 2);
    let obj = back.get(RESCUE_ALL).unwrap();
    assert_eq!(obj.needed_number, 3);
    assert_eq!(obj.current_number, 1);
    assert!(obj.current_entities.contains(&7));
}
