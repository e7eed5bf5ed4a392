//! The ordered objective collection owned by one freeplay event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use callout_core::enums::ObjectiveKind;
use callout_core::types::{EntityId, EventId, ObjectiveTypeId};

use crate::record::Objective;

/// Allocator for the shared objective-instance-ID space.
///
/// Owned by the event registry and passed in explicitly; IDs are
/// monotonic and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveIds {
    next: u32,
}

impl Default for ObjectiveIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl ObjectiveIds {
    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Restore the cursor from a save.
    pub fn resume_at(next: u32) -> Self {
        Self { next }
    }

    pub fn cursor(&self) -> u32 {
        self.next
    }
}

/// All objectives of one event, keyed by objective type ID.
///
/// Invariant: exactly one record per type ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectiveList {
    records: BTreeMap<ObjectiveTypeId, Objective>,
}

impl ObjectiveList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing record for `type_id`, or insert a fresh one
    /// with a new unique instance ID. Never produces a duplicate type ID.
    pub fn get_or_create(
        &mut self,
        type_id: ObjectiveTypeId,
        kind: ObjectiveKind,
        event_id: EventId,
        order_priority: u32,
        ids: &mut ObjectiveIds,
    ) -> &mut Objective {
        self.records
            .entry(type_id)
            .or_insert_with(|| Objective::new(ids.next(), type_id, kind, event_id, order_priority))
    }

    /// Erase and destroy the record for `type_id`. No-op if absent.
    pub fn remove(&mut self, type_id: ObjectiveTypeId) {
        self.records.remove(&type_id);
    }

    pub fn get(&self, type_id: ObjectiveTypeId) -> Option<&Objective> {
        self.records.get(&type_id)
    }

    pub fn get_mut(&mut self, type_id: ObjectiveTypeId) -> Option<&mut Objective> {
        self.records.get_mut(&type_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Objectives ordered by ascending display priority, ties broken by
    /// ascending type ID. Deterministic, for reproducible UI and replay.
    pub fn sorted(&self) -> Vec<&Objective> {
        // BTreeMap iterates in type-ID order; a stable sort on priority
        // keeps that order within equal priorities.
        let mut out: Vec<&Objective> = self.records.values().collect();
        out.sort_by_key(|o| o.order_priority);
        out
    }

    /// Count of records of the given kind ("3/5 objectives complete" UI).
    pub fn count_of_kind(&self, kind: ObjectiveKind) -> usize {
        self.records.values().filter(|o| o.kind == kind).count()
    }

    /// True iff every Required objective is accomplished and no fail
    /// condition has triggered. Success and failure are NOT mutually
    /// exclusive; the event tick resolves a tie as failure.
    pub fn check_success(&self) -> bool {
        let required_done = self
            .records
            .values()
            .filter(|o| o.kind == ObjectiveKind::Required)
            .all(|o| o.check_accomplished());
        required_done && !self.check_failure()
    }

    /// True iff any fail condition has triggered.
    pub fn check_failure(&self) -> bool {
        self.records
            .values()
            .filter(|o| o.kind == ObjectiveKind::FailCondition)
            .any(|o| o.check_accomplished())
    }

    /// Exchange the entire record set with another list in O(1).
    /// Used when a multi-phase script replaces an event's objective set
    /// without destroying the records.
    pub fn swap_with(&mut self, other: &mut ObjectiveList) {
        std::mem::swap(&mut self.records, &mut other.records);
    }

    /// Destroy all records (event shutdown).
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Drain the type IDs of every record mutated since the last drain.
    /// The owning event consumes this each tick for point-gain
    /// bookkeeping.
    pub fn drain_progress(&mut self) -> Vec<ObjectiveTypeId> {
        self.records
            .values_mut()
            .filter_map(|o| o.take_touched().then_some(o.type_id))
            .collect()
    }

    /// Run stale-reference recovery over every record.
    pub fn fulfill_nonexisting_needed_entities(&mut self, is_alive: impl Fn(EntityId) -> bool) {
        for record in self.records.values_mut() {
            record.fulfill_nonexisting_needed_entities(&is_alive);
        }
    }
}
