//! Commands accepted by the freeplay system.
//!
//! Queued by the embedding game loop (or debug tooling) and processed at
//! the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::types::EventId;

/// A command for the freeplay system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FreeplayCommand {
    /// Trigger the event behind `"pool/eventName"`.
    TriggerEvent { path: String },
    /// Re-trigger using the factory that produced the most recent event.
    TriggerLastEvent,
    /// Force-fail an event, bypassing its objectives.
    AbortEvent { event_id: EventId },
    /// Replace the active event pool selection (comma-joined names).
    SetEventPools { names: String },
    /// Add pools to the active selection (comma-joined names).
    AddEventPools { names: String },
    /// Remove pools from the active selection (comma-joined names).
    RemoveEventPools { names: String },
    /// Freeze or unfreeze one event's life/running time and timers.
    SetEventPaused { event_id: EventId, paused: bool },
}
