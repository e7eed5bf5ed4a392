//! Notices emitted by the freeplay system for UI, audio, and logging.
//!
//! The engine never writes to stderr; everything observable about the
//! event lifecycle flows through this feed, drained by the embedder each
//! tick.

use serde::{Deserialize, Serialize};

use crate::enums::NoticeLevel;
use crate::types::{EventId, ObjectiveTypeId};

/// Structured notice from the freeplay system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FreeplayNotice {
    /// An event was created and inserted into the registry.
    EventTriggered { event_id: EventId, name: String },
    /// A trigger attempt was refused before insertion.
    EventRefused { path: String, reason: String },
    /// An event transitioned Hidden -> Running.
    EventSurfaced { event_id: EventId, name: String },
    /// An event finished successfully.
    EventWon { event_id: EventId, points: i32 },
    /// An event finished in failure.
    EventLost { event_id: EventId },
    /// An event was force-failed by external cancellation.
    EventAborted { event_id: EventId },
    /// An event stuck in Hidden state exceeded its fairness timeout.
    EventTimedOut { event_id: EventId },
    /// A saved event could not be restored (e.g. its factory is gone).
    EventDiscarded { name: String, reason: String },
    /// A scripted hint was shown to the player.
    HintShown { event_id: EventId, hint: String },
    /// An objective's progress awarded points.
    ObjectivePoints {
        event_id: EventId,
        objective_type: ObjectiveTypeId,
        points: i32,
    },
    /// A diagnostic alert (e.g. an event lingering with a deferred
    /// completion that never arrived).
    Alert {
        level: NoticeLevel,
        message: String,
        tick: u64,
    },
}
