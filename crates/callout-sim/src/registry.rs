//! Active-event registry with deferred two-phase removal.
//!
//! The registry owns every live `FreeplayEvent`, the shared ID
//! allocators, and the removal queue. Nothing is dropped while the
//! update or dispatch loop is iterating; finished events are marked and
//! destroyed by `flush_removed` once per tick, so hooks may freely walk
//! the registry (via the deferred abort queue) without invalidation.

use std::collections::BTreeMap;

use hecs::World;

use callout_core::notices::FreeplayNotice;
use callout_core::types::{EventId, SimTime};
use callout_objectives::ObjectiveIds;

use crate::event::{EventContext, FinishKind, FreeplayEvent, GameTimerIds};
use crate::messages::Message;
use crate::util::RemovalQueue;

/// Settlement record handed to the freeplay system when an event ends.
#[derive(Debug, Clone)]
pub struct FinishedEvent {
    pub event_id: EventId,
    pub kind: FinishKind,
    /// Final points; zero unless the event was won.
    pub points: i32,
    pub density: f32,
    pub name: String,
}

pub struct EventRegistry {
    events: BTreeMap<EventId, FreeplayEvent>,
    next_event_id: EventId,
    removal: RemovalQueue<EventId>,
    pub objective_ids: ObjectiveIds,
    pub game_timer_ids: GameTimerIds,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            next_event_id: 1,
            removal: RemovalQueue::default(),
            objective_ids: ObjectiveIds::default(),
            game_timer_ids: GameTimerIds::default(),
        }
    }

    /// Assign an ID, run the startup hook, and insert. Returns `None`
    /// when startup refuses, in which case the event is dropped without
    /// ever having been registered.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_event(
        &mut self,
        world: &mut World,
        time: SimTime,
        notices: &mut Vec<FreeplayNotice>,
        abort_requests: &mut Vec<EventId>,
        mut event: FreeplayEvent,
    ) -> Option<EventId> {
        let id = self.next_event_id;
        self.next_event_id += 1;
        event.core_mut().id = id;

        let mut ctx = EventContext {
            world,
            objective_ids: &mut self.objective_ids,
            game_timer_ids: &mut self.game_timer_ids,
            notices: &mut *notices,
            abort_requests,
            time,
        };
        if !event.startup(&mut ctx) {
            return None;
        }

        notices.push(FreeplayNotice::EventTriggered {
            event_id: id,
            name: event.core().display_name.clone(),
        });
        self.events.insert(id, event);
        Some(id)
    }

    /// Re-insert a restored event under its saved ID, keeping the ID
    /// allocator ahead of everything seen so far.
    pub fn insert_restored(&mut self, event: FreeplayEvent) -> EventId {
        let id = event.core().id;
        if id >= self.next_event_id {
            self.next_event_id = id + 1;
        }
        self.events.insert(id, event);
        id
    }

    /// Tick every event in ascending ID order and collect settlement
    /// records for those that announced a finish this tick. Finished
    /// events stay queryable until `flush_removed`.
    pub fn update_events(
        &mut self,
        world: &mut World,
        dt: f64,
        time: SimTime,
        notices: &mut Vec<FreeplayNotice>,
        abort_requests: &mut Vec<EventId>,
    ) -> Vec<FinishedEvent> {
        let Self {
            events,
            objective_ids,
            game_timer_ids,
            removal,
            ..
        } = self;

        let mut finished = Vec::new();
        for event in events.values_mut() {
            let mut ctx = EventContext {
                world: &mut *world,
                objective_ids: &mut *objective_ids,
                game_timer_ids: &mut *game_timer_ids,
                notices: &mut *notices,
                abort_requests: &mut *abort_requests,
                time,
            };
            event.perform_update(&mut ctx, dt);
            if let Some(kind) = event.take_announcement() {
                let record = settle(event, kind);
                push_finish_notice(notices, &record);
                removal.mark(record.event_id);
                finished.push(record);
            }
        }
        finished
    }

    /// Force-fail one event, bypassing its objectives. Returns the
    /// settlement record, or `None` if the event is unknown or already
    /// announced its finish.
    pub fn abort_event(
        &mut self,
        event_id: EventId,
        kind: FinishKind,
        notices: &mut Vec<FreeplayNotice>,
    ) -> Option<FinishedEvent> {
        let event = self.events.get_mut(&event_id)?;
        if event.core().finish_announced() {
            return None;
        }
        event.abort(kind);
        let kind = event.take_announcement()?;
        let record = settle(event, kind);
        push_finish_notice(notices, &record);
        self.removal.mark(event_id);
        Some(record)
    }

    /// Surface a Hidden event immediately. No-op on unknown or already
    /// surfaced events; returns whether the event exists.
    pub fn surface_event(
        &mut self,
        event_id: EventId,
        world: &mut World,
        time: SimTime,
        notices: &mut Vec<FreeplayNotice>,
        abort_requests: &mut Vec<EventId>,
    ) -> bool {
        let Self {
            events,
            objective_ids,
            game_timer_ids,
            ..
        } = self;
        let Some(event) = events.get_mut(&event_id) else {
            return false;
        };
        let mut ctx = EventContext {
            world,
            objective_ids,
            game_timer_ids,
            notices,
            abort_requests,
            time,
        };
        event.set_running(&mut ctx);
        true
    }

    /// Hidden events whose fairness timeout has elapsed.
    pub fn timeout_candidates(&self) -> Vec<EventId> {
        self.events
            .values()
            .filter(|e| e.core().is_timeout() && !e.core().finish_announced())
            .map(|e| e.core().id)
            .collect()
    }

    /// Destroy every event marked for removal: shutdown hook, observer
    /// teardown, entity disassociation, then drop.
    pub fn flush_removed(
        &mut self,
        world: &mut World,
        time: SimTime,
        notices: &mut Vec<FreeplayNotice>,
        abort_requests: &mut Vec<EventId>,
    ) {
        for event_id in self.removal.drain() {
            let Some(mut event) = self.events.remove(&event_id) else {
                continue;
            };
            let mut ctx = EventContext {
                world: &mut *world,
                objective_ids: &mut self.objective_ids,
                game_timer_ids: &mut self.game_timer_ids,
                notices: &mut *notices,
                abort_requests: &mut *abort_requests,
                time,
            };
            event.shutdown(&mut ctx);
        }
    }

    /// Dispatch one bus message to every live event's observers, in
    /// ascending ID order. Events already marked for removal are skipped.
    pub fn dispatch_message(
        &mut self,
        world: &mut World,
        time: SimTime,
        notices: &mut Vec<FreeplayNotice>,
        abort_requests: &mut Vec<EventId>,
        msg: &Message,
    ) {
        let Self {
            events,
            objective_ids,
            game_timer_ids,
            removal,
            ..
        } = self;
        for (id, event) in events.iter_mut() {
            if removal.is_marked(id) {
                continue;
            }
            let mut ctx = EventContext {
                world: &mut *world,
                objective_ids: &mut *objective_ids,
                game_timer_ids: &mut *game_timer_ids,
                notices: &mut *notices,
                abort_requests: &mut *abort_requests,
                time,
            };
            event.dispatch_message(&mut ctx, msg);
        }
    }

    pub fn get(&self, event_id: EventId) -> Option<&FreeplayEvent> {
        self.events.get(&event_id)
    }

    pub fn get_mut(&mut self, event_id: EventId) -> Option<&mut FreeplayEvent> {
        self.events.get_mut(&event_id)
    }

    pub fn contains(&self, event_id: EventId) -> bool {
        self.events.contains_key(&event_id)
    }

    pub fn is_marked_removed(&self, event_id: EventId) -> bool {
        self.removal.is_marked(&event_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FreeplayEvent> {
        self.events.values()
    }

    /// The most recently inserted event still registered (IDs are
    /// monotonic). Debug and "jump to event" tooling.
    pub fn last_event(&self) -> Option<&FreeplayEvent> {
        self.events.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of the density of every live event not yet marked removed.
    pub fn active_density(&self) -> f32 {
        self.events
            .iter()
            .filter(|(id, _)| !self.removal.is_marked(id))
            .map(|(_, e)| e.core().density)
            .sum()
    }

    pub fn event_id_cursor(&self) -> EventId {
        self.next_event_id
    }

    pub fn resume_event_ids(&mut self, next: EventId) {
        if next > self.next_event_id {
            self.next_event_id = next;
        }
    }
}

fn settle(event: &FreeplayEvent, kind: FinishKind) -> FinishedEvent {
    let core = event.core();
    FinishedEvent {
        event_id: core.id,
        kind,
        points: if kind.successful() {
            core.score.points
        } else {
            0
        },
        density: core.density,
        name: core.display_name.clone(),
    }
}

fn push_finish_notice(notices: &mut Vec<FreeplayNotice>, record: &FinishedEvent) {
    let event_id = record.event_id;
    notices.push(match record.kind {
        FinishKind::Won => FreeplayNotice::EventWon {
            event_id,
            points: record.points,
        },
        FinishKind::Lost => FreeplayNotice::EventLost { event_id },
        FinishKind::Aborted => FreeplayNotice::EventAborted { event_id },
        FinishKind::TimedOut => FreeplayNotice::EventTimedOut { event_id },
    });
}
