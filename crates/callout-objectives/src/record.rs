//! A single win/fail condition with counters and entity associations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use callout_core::enums::ObjectiveKind;
use callout_core::types::{EntityId, EventId, ObjectiveTypeId};

/// One objective of a freeplay event.
///
/// Counters track progress (`current_number` toward `needed_number`);
/// the entity sets record *which* entities contributed, with uniqueness
/// enforced. All mutations are total: counter underflow is a caller
/// contract violation, debug-asserted and saturating in release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    /// Unique instance ID, assigned from the shared `ObjectiveIds` space.
    pub id: u32,
    /// Stable kind-of-objective ID, unique within the owning list.
    pub type_id: ObjectiveTypeId,
    pub kind: ObjectiveKind,
    pub current_number: u32,
    pub needed_number: u32,
    pub current_entities: BTreeSet<EntityId>,
    pub needed_entities: BTreeSet<EntityId>,
    /// Counts toward success/failure but is not shown to the player.
    pub hidden: bool,
    /// Display order priority; lower sorts first.
    pub order_priority: u32,
    /// Back-reference to the owning event. Never ownership.
    pub event_id: EventId,
    /// Localizable display text.
    pub text: String,
    /// Progress-dirty flag consumed by the owning event's point-gain
    /// bookkeeping each tick. Not part of the save contract.
    #[serde(skip)]
    touched: bool,
}

impl Objective {
    pub(crate) fn new(
        id: u32,
        type_id: ObjectiveTypeId,
        kind: ObjectiveKind,
        event_id: EventId,
        order_priority: u32,
    ) -> Self {
        Self {
            id,
            type_id,
            kind,
            current_number: 0,
            needed_number: 0,
            current_entities: BTreeSet::new(),
            needed_entities: BTreeSet::new(),
            hidden: false,
            order_priority,
            event_id,
            text: String::new(),
            touched: false,
        }
    }

    /// Pure accomplishment query.
    ///
    /// - `OptionalFailed` is never accomplished.
    /// - A zero-need objective is accomplished — unless it is a fail
    ///   condition, which needing zero entities can never trigger.
    /// - Otherwise accomplished iff `current_number >= needed_number`.
    pub fn check_accomplished(&self) -> bool {
        if self.kind == ObjectiveKind::OptionalFailed {
            return false;
        }
        if self.needed_number == 0 {
            return self.kind != ObjectiveKind::FailCondition;
        }
        self.current_number >= self.needed_number
    }

    // --- current number ---

    pub fn set_current_number(&mut self, n: u32) {
        if self.current_number != n {
            self.current_number = n;
            self.touched = true;
        }
    }

    /// Increment progress. When an entity is supplied, the whole call is
    /// a no-op if that entity already contributed (idempotent).
    pub fn increase_current_number(&mut self, entity: Option<EntityId>) {
        if let Some(id) = entity {
            if !self.current_entities.insert(id) {
                return;
            }
        }
        self.current_number += 1;
        self.touched = true;
    }

    /// Decrement progress. When an entity is supplied, the call is a
    /// no-op unless that entity had contributed.
    pub fn decrease_current_number(&mut self, entity: Option<EntityId>) {
        if let Some(id) = entity {
            if !self.current_entities.remove(&id) {
                return;
            }
        }
        debug_assert!(self.current_number > 0, "current_number underflow");
        self.current_number = self.current_number.saturating_sub(1);
        self.touched = true;
    }

    // --- needed number ---

    pub fn set_needed_number(&mut self, n: u32) {
        if self.needed_number != n {
            self.needed_number = n;
            self.touched = true;
        }
    }

    pub fn increase_needed_number(&mut self, entity: Option<EntityId>) {
        if let Some(id) = entity {
            if !self.needed_entities.insert(id) {
                return;
            }
        }
        self.needed_number += 1;
        self.touched = true;
    }

    pub fn decrease_needed_number(&mut self, entity: Option<EntityId>) {
        if let Some(id) = entity {
            if !self.needed_entities.remove(&id) {
                return;
            }
        }
        debug_assert!(self.needed_number > 0, "needed_number underflow");
        self.needed_number = self.needed_number.saturating_sub(1);
        self.touched = true;
    }

    /// Force the record into an accomplished state.
    pub fn set_accomplished(&mut self) {
        if self.needed_number == 0 {
            self.needed_number = 1;
        }
        self.current_number = self.needed_number;
        self.touched = true;
    }

    /// Stale-reference recovery: every needed entity that no longer
    /// resolves to a live entity is silently counted as fulfilled, so a
    /// desynchronized save cannot leave the objective permanently
    /// unwinnable. Fail-open by design.
    pub fn fulfill_nonexisting_needed_entities(&mut self, is_alive: impl Fn(EntityId) -> bool) {
        let dead: Vec<EntityId> = self
            .needed_entities
            .iter()
            .copied()
            .filter(|&id| !is_alive(id) && !self.current_entities.contains(&id))
            .collect();
        for id in dead {
            self.current_entities.insert(id);
            self.current_number += 1;
            self.touched = true;
        }
    }

    /// Consume the progress-dirty flag.
    pub(crate) fn take_touched(&mut self) -> bool {
        std::mem::take(&mut self.touched)
    }
}
