//! Publish-subscribe message bus connecting game logic to event observers.
//!
//! Messages carry an opaque condition ID, the entity they concern, and a
//! string parameter bag. The bus is a plain FIFO drained once per tick by
//! the freeplay system and dispatched synchronously to every active
//! event's observers.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use callout_core::types::{EntityId, MessageId};

/// A published game message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// The entity this message concerns (`MAP_SCOPE` observers see all).
    pub entity: EntityId,
    /// Free-form parameters.
    pub params: BTreeMap<String, String>,
}

impl Message {
    pub fn new(id: MessageId, entity: EntityId) -> Self {
        Self {
            id,
            entity,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }
}

/// FIFO message queue.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    queue: VecDeque<Message>,
}

impl MessageBus {
    pub fn publish(&mut self, msg: Message) {
        self.queue.push_back(msg);
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
