//! Enumeration types used throughout the freeplay simulation.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a freeplay event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventState {
    /// Started up, accruing density and life time, not yet shown to the player.
    #[default]
    Hidden,
    /// Surfaced and running; objectives are evaluated every tick.
    Running,
    /// Terminal: the player won the event.
    Succeeded,
    /// Terminal: the player lost the event (or it was aborted / timed out).
    Failed,
}

impl EventState {
    /// Whether this is a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, EventState::Succeeded | EventState::Failed)
    }
}

/// Kind of an objective record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Must be accomplished for the event to succeed.
    #[default]
    Required,
    /// Accomplishment signals event failure, not progress.
    FailCondition,
    /// Counts toward bonus scoring only.
    Optional,
    /// An optional objective that was missed; never accomplished.
    OptionalFailed,
}

/// Why an entity became associated with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadReason {
    /// Directly scripted into the event.
    Scripted,
    /// Pulled in by proximity to the incident.
    Proximity,
    /// Became a casualty of the incident.
    Injury,
    /// Caught fire.
    Fire,
    /// Took structural damage.
    Damage,
    /// Was contaminated (hazmat).
    Contamination,
}

/// How a success/failure hook wants the completion handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionDecision {
    /// Finish the event now; the system is informed immediately.
    #[default]
    CompletedNow,
    /// The behavior will inform the system later itself (e.g. after a
    /// scripted ending sequence has played out).
    CompletionDeferred,
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Critical,
}
