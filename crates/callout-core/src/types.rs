//! Fundamental identifier and simulation time types.

use serde::{Deserialize, Serialize};

/// Opaque 64-bit entity handle (the bit pattern of a `hecs::Entity`).
///
/// The freeplay core never dereferences entities itself; it only stores,
/// compares, and hands these back to the world collaborator.
pub type EntityId = u64;

/// Sentinel entity ID meaning "the whole map" (observer scope).
/// `hecs` entity bits are never zero, so this cannot collide with a live entity.
pub const MAP_SCOPE: EntityId = 0;

/// Unique ID of a running freeplay event, assigned at registry insertion.
pub type EventId = u32;

/// Stable ID identifying the *kind* of an objective (e.g. "rescue all
/// casualties"), unique within one event's objective list.
pub type ObjectiveTypeId = u32;

/// Stable ID identifying the kind of an observer.
pub type ObserverTypeId = u32;

/// Opaque message / condition identifier for the publish-subscribe bus.
pub type MessageId = u64;

/// Caller-chosen small timer ID, private to one event.
pub type TimerId = u32;

/// Internally generated, globally unique game timer ID.
pub type GameTimerId = u64;

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Seconds per tick at the default tick rate.
    pub fn dt(&self) -> f64 {
        crate::constants::DT
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt();
    }
}
