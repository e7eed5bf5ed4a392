//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Game logic lives in systems, not components.

use serde::{Deserialize, Serialize};

use crate::enums::SpreadReason;
use crate::types::EventId;

/// Back-reference from an entity to the freeplay event it currently
/// belongs to. Relation and lookup only — neither side owns the other;
/// both must tolerate the other disappearing first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLink {
    /// The owning event's ID.
    pub event_id: EventId,
    /// Every reason this entity was associated, in first-seen order.
    pub reasons: Vec<SpreadReason>,
}

/// A person needing rescue (demo scenario component).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Casualty {
    /// Remaining health (0.0 = lost).
    pub health: f64,
    /// Whether a unit has rescued this person.
    pub rescued: bool,
}

/// A burning or otherwise dangerous object (demo scenario component).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    /// Abstract intensity; 0.0 = extinguished/neutralized.
    pub intensity: f64,
}
