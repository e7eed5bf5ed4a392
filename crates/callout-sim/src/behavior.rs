//! The template-method surface implemented by each incident kind.
//!
//! The set of kinds is open-ended (data-driven, scripted), so the core
//! state machine holds a `Box<dyn EventBehavior>` and never enumerates
//! concrete kinds. Every hook has a default so trivial incidents stay
//! small.

use hecs::World;

use callout_core::enums::{CompletionDecision, SpreadReason};
use callout_core::types::{EntityId, TimerId};

use crate::event::{EventContext, EventCore};
use crate::messages::Message;

/// Scripted half of a freeplay event.
#[allow(unused_variables)]
pub trait EventBehavior {
    /// Validation gate evaluated before startup; false prevents the
    /// event from ever being inserted.
    fn check_configuration(&self, core: &EventCore) -> bool {
        true
    }

    /// One-time setup: objectives, observers, entity associations.
    /// Returning false discards the event.
    fn on_startup(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) -> bool {
        true
    }

    /// Teardown hook, called once from shutdown.
    fn on_shutdown(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) {}

    /// Fired once on the Hidden -> Running transition.
    fn on_run(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) {}

    /// The event's objectives evaluated to a win. Return
    /// `CompletionDeferred` to play out a scripted ending first; the
    /// behavior must then call `core.request_finish(true)` itself.
    fn on_success(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) -> CompletionDecision {
        CompletionDecision::CompletedNow
    }

    /// The event's objectives evaluated to a loss. Deferral works as in
    /// `on_success`.
    fn on_failure(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) -> CompletionDecision {
        CompletionDecision::CompletedNow
    }

    /// Incident-specific per-tick logic.
    fn update(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>, dt: f64) {}

    /// A countdown timer started by this event fired. `timer` is the
    /// caller-chosen ID, never the internal game timer ID.
    fn on_timer_triggered(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>, timer: TimerId) {
    }

    /// An entity was associated with this event. `new_reason` is true
    /// the first time this (entity, reason) pair is seen. Return false
    /// to reject the association at the scripting level.
    fn add_entity(
        &mut self,
        core: &mut EventCore,
        ctx: &mut EventContext<'_>,
        entity: EntityId,
        reason: SpreadReason,
        new_reason: bool,
    ) -> bool {
        true
    }

    /// Called back by an observer that triggered on `entity`.
    fn hint_callback(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>, entity: EntityId) {
    }

    /// Like `hint_callback`, with the full triggering message.
    fn hint_callback_with_message(
        &mut self,
        core: &mut EventCore,
        ctx: &mut EventContext<'_>,
        msg: &Message,
    ) {
    }

    /// The entity a camera should focus for this event.
    fn focus_entity(&self, core: &EventCore, world: &World) -> Option<EntityId> {
        core.entities().next()
    }

    /// Final point gain computed when the event succeeds. The default
    /// keeps the points accumulated from objective progress.
    fn calculate_point_gain(&self, core: &EventCore) -> i32 {
        core.score.points
    }

    /// Re-wire runtime state (observers) after a save has been loaded.
    fn on_restore(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) {}
}

/// Behavior with no scripting at all. Used as the restore fallback for
/// factories that carry no behavior state.
#[derive(Debug, Default)]
pub struct DefaultBehavior;

impl EventBehavior for DefaultBehavior {}
