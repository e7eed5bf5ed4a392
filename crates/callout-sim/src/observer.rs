//! Entity- and map-scoped condition watchers owned by one event.
//!
//! An observer watches one entity (or the whole map with `MAP_SCOPE`)
//! for one message and calls back into the owning event when it fires.
//! An observer may request its own removal from inside its callback;
//! removal is deferred and flushed after the dispatch loop completes —
//! the same two-phase discipline the event registry uses.

use std::fmt;

use callout_core::types::{EntityId, MessageId, ObjectiveTypeId, ObserverTypeId, MAP_SCOPE};

use crate::behavior::EventBehavior;
use crate::event::{EventContext, EventCore};
use crate::messages::Message;
use crate::util::RemovalQueue;

/// What an observer wants after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverFlow {
    Keep,
    Remove,
}

/// Identity of one observer: kind plus watched entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObserverKey {
    pub type_id: ObserverTypeId,
    pub entity: EntityId,
}

/// A condition watcher calling back into its owning event.
pub trait Observer {
    fn on_message(
        &mut self,
        core: &mut EventCore,
        behavior: &mut dyn EventBehavior,
        ctx: &mut EventContext<'_>,
        msg: &Message,
    ) -> ObserverFlow;
}

pub struct ObserverSlot {
    pub key: ObserverKey,
    pub message: MessageId,
    pub observer: Box<dyn Observer>,
}

impl ObserverSlot {
    /// Whether this observer wants the given message: same message ID,
    /// and either the exact entity or map scope.
    pub fn matches(&self, msg: &Message) -> bool {
        self.message == msg.id && (self.key.entity == MAP_SCOPE || self.key.entity == msg.entity)
    }
}

/// The observer map of one event, with deferred removal.
#[derive(Default)]
pub struct ObserverSet {
    slots: Vec<ObserverSlot>,
    removal: RemovalQueue<ObserverKey>,
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("len", &self.slots.len())
            .finish()
    }
}

impl ObserverSet {
    /// Insert, replacing any observer with the same key.
    pub fn insert(&mut self, key: ObserverKey, message: MessageId, observer: Box<dyn Observer>) {
        self.slots.retain(|s| s.key != key);
        self.slots.push(ObserverSlot {
            key,
            message,
            observer,
        });
    }

    pub fn get(&self, key: &ObserverKey) -> Option<&dyn Observer> {
        self.slots
            .iter()
            .find(|s| s.key == *key)
            .map(|s| s.observer.as_ref())
    }

    pub fn contains(&self, key: &ObserverKey) -> bool {
        self.slots.iter().any(|s| s.key == *key) && !self.removal.is_marked(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn mark_removed(&mut self, key: ObserverKey) {
        self.removal.mark(key);
    }

    pub fn is_marked_removed(&self, key: &ObserverKey) -> bool {
        self.removal.is_marked(key)
    }

    pub fn flush_removals(&mut self) {
        if self.removal.is_empty() {
            return;
        }
        let removed = self.removal.drain();
        self.slots.retain(|s| !removed.contains(&s.key));
    }

    /// Take the slot list for a dispatch loop. Observers added during
    /// the loop land in the (now empty) set and are merged back by
    /// `restore_slots`.
    pub fn take_slots(&mut self) -> Vec<ObserverSlot> {
        std::mem::take(&mut self.slots)
    }

    /// Merge back the slots taken for dispatch. A slot registered during
    /// the loop wins over a taken slot with the same key, so `insert`'s
    /// replace-on-same-key contract holds across dispatch too.
    pub fn restore_slots(&mut self, mut slots: Vec<ObserverSlot>) {
        let added = std::mem::take(&mut self.slots);
        slots.retain(|s| !added.iter().any(|a| a.key == s.key));
        slots.extend(added);
        self.slots = slots;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.removal.clear();
    }
}

/// The bread-and-butter observer: on a matching message, count the
/// message's entity toward one objective and hand the message to the
/// behavior's hint callback.
pub struct CountOnMessage {
    objective_type: ObjectiveTypeId,
    /// Remove this observer once its objective is accomplished.
    remove_when_accomplished: bool,
}

impl CountOnMessage {
    pub fn new(objective_type: ObjectiveTypeId) -> Self {
        Self {
            objective_type,
            remove_when_accomplished: false,
        }
    }

    pub fn remove_when_accomplished(mut self) -> Self {
        self.remove_when_accomplished = true;
        self
    }
}

impl Observer for CountOnMessage {
    fn on_message(
        &mut self,
        core: &mut EventCore,
        behavior: &mut dyn EventBehavior,
        ctx: &mut EventContext<'_>,
        msg: &Message,
    ) -> ObserverFlow {
        let accomplished = {
            let Some(obj) = core.objectives.get_mut(self.objective_type) else {
                return ObserverFlow::Remove;
            };
            obj.increase_current_number(Some(msg.entity));
            obj.check_accomplished()
        };
        behavior.hint_callback_with_message(core, ctx, msg);
        if self.remove_when_accomplished && accomplished {
            ObserverFlow::Remove
        } else {
            ObserverFlow::Keep
        }
    }
}
