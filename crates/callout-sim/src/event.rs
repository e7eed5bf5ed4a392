//! The freeplay event state machine.
//!
//! `EventCore` is the plain data half: counters, timers, hints,
//! objectives, entity associations, and the state enum. `FreeplayEvent`
//! pairs it with a boxed `EventBehavior` — the open-ended, scripted half
//! of a concrete incident kind — and drives the transitions. Keeping the
//! two in separate fields is what lets hooks borrow the core mutably
//! while the behavior itself is being called.

use std::collections::{BTreeMap, BTreeSet};

use hecs::World;
use serde::{Deserialize, Serialize};

use callout_core::components::EventLink;
use callout_core::constants::{
    DEFAULT_EVENT_DENSITY, DEFAULT_EVENT_TIMEOUT_SECS, DEFAULT_OBJECTIVE_POINTS,
    DEFAULT_OBJECTIVE_PRIORITY, DEFERRED_FINISH_WARN_SECS,
};
use callout_core::enums::{
    CompletionDecision, EventState, NoticeLevel, ObjectiveKind, SpreadReason,
};
use callout_core::notices::FreeplayNotice;
use callout_core::types::{
    EntityId, EventId, GameTimerId, ObjectiveTypeId, ObserverTypeId, SimTime, TimerId,
};
use callout_objectives::{Objective, ObjectiveIds, ObjectiveList};

use crate::behavior::EventBehavior;
use crate::messages::Message;
use crate::observer::{Observer, ObserverFlow, ObserverKey, ObserverSet};
use crate::util::fnv1a_64;

/// Allocator for internally generated, globally unique game timer IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTimerIds {
    next: GameTimerId,
}

impl Default for GameTimerIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl GameTimerIds {
    pub fn next(&mut self) -> GameTimerId {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn resume_at(next: GameTimerId) -> Self {
        Self { next }
    }

    pub fn cursor(&self) -> GameTimerId {
        self.next
    }
}

/// A named countdown timer owned by one event.
///
/// Paused in lock-step with the event's running time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTimer {
    /// The globally unique internal timer ID.
    pub game_timer_id: GameTimerId,
    /// Seconds until the timer fires.
    pub remaining_secs: f64,
}

/// Scoring accumulated by one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventScore {
    pub points: i32,
    pub multiplayer_points: i32,
    pub campaign_credits: i32,
}

/// How an event ended. Drives the notice the registry emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishKind {
    Won,
    Lost,
    /// Force-failed by external cancellation, objectives bypassed.
    Aborted,
    /// Force-failed by the fairness timeout while still Hidden.
    TimedOut,
}

impl FinishKind {
    pub fn successful(&self) -> bool {
        matches!(self, FinishKind::Won)
    }
}

/// Everything a hook may touch besides the event itself: the world, the
/// shared ID allocators, the notice feed, and the deferred cross-event
/// abort queue.
pub struct EventContext<'a> {
    pub world: &'a mut World,
    pub objective_ids: &'a mut ObjectiveIds,
    pub game_timer_ids: &'a mut GameTimerIds,
    pub notices: &'a mut Vec<FreeplayNotice>,
    /// Events to force-fail once the current dispatch loop completes.
    pub abort_requests: &'a mut Vec<EventId>,
    pub time: SimTime,
}

/// State-machine data of one running freeplay event.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventCore {
    /// Unique ID, assigned at registry insertion.
    pub id: EventId,
    /// `"pool/name"` of the factory that produced this event.
    pub factory_path: String,
    /// Localizable display name.
    pub display_name: String,
    pub state: EventState,
    /// Seconds since startup (frozen while paused).
    pub life_time: f64,
    /// Seconds since the event surfaced (frozen while paused).
    pub running_time: f64,
    pub time_paused: bool,
    /// Fairness timeout while Hidden.
    pub timeout_secs: f64,
    /// Suppresses an otherwise-valid win determination (multi-phase scripts).
    pub can_win: bool,
    /// Suppresses an otherwise-valid loss determination.
    pub can_lose: bool,
    /// Contribution to the global event density while active.
    pub density: f32,
    pub score: EventScore,
    /// Per-objective point table; absent entries fall back to the default.
    pub objective_points: BTreeMap<ObjectiveTypeId, i32>,
    pub objectives: ObjectiveList,

    rewarded: BTreeSet<ObjectiveTypeId>,
    entity_reasons: BTreeMap<EntityId, Vec<SpreadReason>>,
    shown_hints: BTreeSet<u64>,
    timers: BTreeMap<TimerId, EventTimer>,
    finish_announced: bool,
    /// `life_time` at which a deferred completion began.
    deferred_since: Option<f64>,
    lingering_warned: bool,

    #[serde(skip)]
    observers: ObserverSet,
    #[serde(skip)]
    run_requested: bool,
    #[serde(skip)]
    finish_requested: Option<bool>,
    #[serde(skip)]
    pending_announcement: Option<FinishKind>,
}

impl EventCore {
    pub fn new(factory_path: &str, display_name: &str) -> Self {
        Self {
            id: 0,
            factory_path: factory_path.to_string(),
            display_name: display_name.to_string(),
            state: EventState::Hidden,
            life_time: 0.0,
            running_time: 0.0,
            time_paused: false,
            timeout_secs: DEFAULT_EVENT_TIMEOUT_SECS,
            can_win: true,
            can_lose: true,
            density: DEFAULT_EVENT_DENSITY,
            score: EventScore::default(),
            objective_points: BTreeMap::new(),
            objectives: ObjectiveList::new(),
            rewarded: BTreeSet::new(),
            entity_reasons: BTreeMap::new(),
            shown_hints: BTreeSet::new(),
            timers: BTreeMap::new(),
            finish_announced: false,
            deferred_since: None,
            lingering_warned: false,
            observers: ObserverSet::default(),
            run_requested: false,
            finish_requested: None,
            pending_announcement: None,
        }
    }

    // --- objectives ---

    /// Get or create a Required objective for this event.
    pub fn add_objective(
        &mut self,
        type_id: ObjectiveTypeId,
        ids: &mut ObjectiveIds,
    ) -> &mut Objective {
        let event_id = self.id;
        self.objectives.get_or_create(
            type_id,
            ObjectiveKind::Required,
            event_id,
            DEFAULT_OBJECTIVE_PRIORITY,
            ids,
        )
    }

    /// Get or create a fail condition for this event.
    pub fn add_fail_condition(
        &mut self,
        type_id: ObjectiveTypeId,
        ids: &mut ObjectiveIds,
    ) -> &mut Objective {
        let event_id = self.id;
        self.objectives.get_or_create(
            type_id,
            ObjectiveKind::FailCondition,
            event_id,
            DEFAULT_OBJECTIVE_PRIORITY,
            ids,
        )
    }

    // --- time ---

    pub fn set_time_paused(&mut self, paused: bool) {
        self.time_paused = paused;
    }

    /// Whether the fairness timeout has elapsed (Hidden state only).
    pub fn is_timeout(&self) -> bool {
        self.state == EventState::Hidden && self.life_time > self.timeout_secs
    }

    // --- completion ---

    /// Request the Hidden -> Running transition. Honored at the start of
    /// the next update so the `on_run` hook and surfacing notice go
    /// through the usual path. No-op once surfaced.
    pub fn request_run(&mut self) {
        self.run_requested = true;
    }

    /// Request the deferred "inform the system we are finished" call.
    /// Used by behaviors that returned `CompletionDeferred` from a
    /// success/failure hook; honored at the end of the current update.
    pub fn request_finish(&mut self, successful: bool) {
        self.finish_requested = Some(successful);
    }

    pub fn finish_announced(&self) -> bool {
        self.finish_announced
    }

    // --- timers ---

    /// Start (or restart) the countdown timer `timer`.
    pub fn start_timer(&mut self, ids: &mut GameTimerIds, timer: TimerId, wait_secs: f64) {
        self.timers.insert(
            timer,
            EventTimer {
                game_timer_id: ids.next(),
                remaining_secs: wait_secs,
            },
        );
    }

    /// Adjust the remaining time of a running timer. No-op if absent.
    pub fn set_timer(&mut self, timer: TimerId, remaining_secs: f64) {
        debug_assert!(self.timers.contains_key(&timer), "set_timer on unknown timer");
        if let Some(t) = self.timers.get_mut(&timer) {
            t.remaining_secs = remaining_secs;
        }
    }

    pub fn cancel_timer(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }

    /// Force a timer to fire on the next timer pass.
    pub fn trigger_timer(&mut self, timer: TimerId) {
        if let Some(t) = self.timers.get_mut(&timer) {
            t.remaining_secs = 0.0;
        }
    }

    pub fn has_timer(&self, timer: TimerId) -> bool {
        self.timers.contains_key(&timer)
    }

    pub fn timer_remaining(&self, timer: TimerId) -> Option<f64> {
        self.timers.get(&timer).map(|t| t.remaining_secs)
    }

    /// Advance all timers by `dt`, removing and returning those that fired.
    fn tick_timers(&mut self, dt: f64) -> Vec<TimerId> {
        let mut fired = Vec::new();
        for (id, timer) in self.timers.iter_mut() {
            timer.remaining_secs -= dt;
            if timer.remaining_secs <= 0.0 {
                fired.push(*id);
            }
        }
        for id in &fired {
            self.timers.remove(id);
        }
        fired
    }

    // --- hints ---

    /// Show a scripted hint. With `not_more_than_once`, a hint name that
    /// was already shown is suppressed. Returns whether the hint fired.
    pub fn show_hint(
        &mut self,
        name: &str,
        not_more_than_once: bool,
        notices: &mut Vec<FreeplayNotice>,
    ) -> bool {
        let key = fnv1a_64(name);
        if not_more_than_once && self.shown_hints.contains(&key) {
            return false;
        }
        self.shown_hints.insert(key);
        notices.push(FreeplayNotice::HintShown {
            event_id: self.id,
            hint: name.to_string(),
        });
        true
    }

    pub fn was_hint_shown(&self, name: &str) -> bool {
        self.shown_hints.contains(&fnv1a_64(name))
    }

    /// Record a hint as shown without displaying it (suppresses a later
    /// `show_hint` from a different code path).
    pub fn mark_hint_as_shown(&mut self, name: &str) {
        self.shown_hints.insert(fnv1a_64(name));
    }

    // --- observers ---

    /// Register an observer watching `message` on `entity` (or
    /// `MAP_SCOPE` for the whole map). Replaces any observer with the
    /// same (type, entity) key.
    pub fn add_observer(
        &mut self,
        type_id: ObserverTypeId,
        entity: EntityId,
        message: callout_core::types::MessageId,
        observer: Box<dyn Observer>,
    ) {
        self.observers
            .insert(ObserverKey { type_id, entity }, message, observer);
    }

    pub fn has_observer(&self, type_id: ObserverTypeId, entity: EntityId) -> bool {
        self.observers.contains(&ObserverKey { type_id, entity })
    }

    pub fn get_observer(&self, type_id: ObserverTypeId, entity: EntityId) -> Option<&dyn Observer> {
        self.observers.get(&ObserverKey { type_id, entity })
    }

    /// Mark an observer for removal; flushed after the current dispatch
    /// loop so an observer may remove itself from its own callback.
    pub fn remove_observer(&mut self, type_id: ObserverTypeId, entity: EntityId) {
        self.observers.mark_removed(ObserverKey { type_id, entity });
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn flush_observer_removals(&mut self) {
        self.observers.flush_removals();
    }

    // --- entity association ---

    /// Associate an entity with this event, writing the `EventLink`
    /// back-reference component. Returns whether this (entity, reason)
    /// pair is seen for the first time.
    pub fn associate_entity(
        &mut self,
        world: &mut World,
        entity: EntityId,
        reason: SpreadReason,
    ) -> bool {
        let reasons = self.entity_reasons.entry(entity).or_default();
        let new_reason = !reasons.contains(&reason);
        if new_reason {
            reasons.push(reason);
        }

        let event_id = self.id;
        if let Some(live) = hecs::Entity::from_bits(entity) {
            if world.contains(live) {
                let has_link = world.get::<&EventLink>(live).is_ok();
                if has_link {
                    if let Ok(link) = world.query_one_mut::<&mut EventLink>(live) {
                        link.event_id = event_id;
                        if !link.reasons.contains(&reason) {
                            link.reasons.push(reason);
                        }
                    }
                } else {
                    let _ = world.insert_one(
                        live,
                        EventLink {
                            event_id,
                            reasons: vec![reason],
                        },
                    );
                }
            }
        }
        new_reason
    }

    /// Entities currently associated with this event, ascending by ID.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entity_reasons.keys().copied()
    }

    pub fn is_associated(&self, entity: EntityId) -> bool {
        self.entity_reasons.contains_key(&entity)
    }

    /// Rewrite the `EventLink` back-references for every associated
    /// entity that is live in `world`. Used after a save has been loaded
    /// into a world restored separately.
    pub(crate) fn restore_links(&self, world: &mut World) {
        for (&entity, reasons) in &self.entity_reasons {
            let Some(live) = hecs::Entity::from_bits(entity) else {
                continue;
            };
            if !world.contains(live) {
                continue;
            }
            let _ = world.insert_one(
                live,
                EventLink {
                    event_id: self.id,
                    reasons: reasons.clone(),
                },
            );
        }
    }

    /// Remove every back-reference this event holds on live entities.
    /// Tolerates entities that disappeared first, and leaves links that
    /// another event has since overwritten.
    fn disassociate_all(&mut self, world: &mut World) {
        for &entity in self.entity_reasons.keys() {
            let Some(live) = hecs::Entity::from_bits(entity) else {
                continue;
            };
            if !world.contains(live) {
                continue;
            }
            let points_here = world
                .query_one_mut::<&EventLink>(live)
                .map(|link| link.event_id == self.id)
                .unwrap_or(false);
            if points_here {
                let _ = world.remove_one::<EventLink>(live);
            }
        }
        self.entity_reasons.clear();
    }
}

/// One running incident: state-machine core plus scripted behavior.
pub struct FreeplayEvent {
    core: EventCore,
    behavior: Box<dyn EventBehavior>,
}

impl FreeplayEvent {
    pub fn new(behavior: Box<dyn EventBehavior>, factory_path: &str, display_name: &str) -> Self {
        Self {
            core: EventCore::new(factory_path, display_name),
            behavior,
        }
    }

    /// Reassemble an event from a saved core and a factory-restored behavior.
    pub fn from_parts(core: EventCore, behavior: Box<dyn EventBehavior>) -> Self {
        Self { core, behavior }
    }

    pub fn core(&self) -> &EventCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EventCore {
        &mut self.core
    }

    /// Validation gate run before startup; a false here means the event
    /// is never inserted.
    pub fn check_configuration(&self) -> bool {
        self.behavior.check_configuration(&self.core)
    }

    /// One-time startup. Returning false discards the event — the only
    /// point after construction where creation can fail.
    pub fn startup(&mut self, ctx: &mut EventContext<'_>) -> bool {
        debug_assert_eq!(self.core.state, EventState::Hidden, "startup on non-Hidden event");
        self.behavior.on_startup(&mut self.core, ctx)
    }

    /// Idempotent Hidden -> Running transition; fires `on_run` once and
    /// resets the running clock.
    pub fn set_running(&mut self, ctx: &mut EventContext<'_>) {
        if self.core.state != EventState::Hidden {
            return;
        }
        self.core.state = EventState::Running;
        self.core.running_time = 0.0;
        self.behavior.on_run(&mut self.core, ctx);
        ctx.notices.push(FreeplayNotice::EventSurfaced {
            event_id: self.core.id,
            name: self.core.display_name.clone(),
        });
    }

    /// Per-tick update, called by the registry for every event
    /// regardless of state.
    pub fn perform_update(&mut self, ctx: &mut EventContext<'_>, dt: f64) {
        if std::mem::take(&mut self.core.run_requested) {
            self.set_running(ctx);
        }
        if !self.core.time_paused {
            self.core.life_time += dt;
            if self.core.state == EventState::Running {
                self.core.running_time += dt;
            }
            for timer in self.core.tick_timers(dt) {
                self.behavior.on_timer_triggered(&mut self.core, ctx, timer);
            }
        }

        self.behavior.update(&mut self.core, ctx, dt);

        // Deferred completion arriving from a hook this tick.
        if let Some(successful) = self.core.finish_requested.take() {
            let kind = if successful {
                FinishKind::Won
            } else {
                FinishKind::Lost
            };
            self.set_finished(kind);
        }

        self.settle_objective_progress(ctx);
        self.check_objectives_state(ctx);
        self.core.flush_observer_removals();
        self.warn_if_lingering(ctx);
    }

    /// Point-gain bookkeeping over objectives mutated since last tick.
    fn settle_objective_progress(&mut self, ctx: &mut EventContext<'_>) {
        for type_id in self.core.objectives.drain_progress() {
            let Some(obj) = self.core.objectives.get(type_id) else {
                continue;
            };
            let scoring_kind = !matches!(
                obj.kind,
                ObjectiveKind::FailCondition | ObjectiveKind::OptionalFailed
            );
            if scoring_kind && obj.check_accomplished() && self.core.rewarded.insert(type_id) {
                let points = self
                    .core
                    .objective_points
                    .get(&type_id)
                    .copied()
                    .unwrap_or(DEFAULT_OBJECTIVE_POINTS);
                self.core.score.points += points;
                ctx.notices.push(FreeplayNotice::ObjectivePoints {
                    event_id: self.core.id,
                    objective_type: type_id,
                    points,
                });
            }
        }
    }

    /// Evaluate the objective list while Running. Failure is checked
    /// before success: when both hold in the same tick, the event fails.
    fn check_objectives_state(&mut self, ctx: &mut EventContext<'_>) {
        if self.core.state != EventState::Running {
            return;
        }
        if self.core.can_lose && self.core.objectives.check_failure() {
            self.finish_from_hook(FinishKind::Lost, ctx);
        } else if self.core.can_win && self.core.objectives.check_success() {
            self.finish_from_hook(FinishKind::Won, ctx);
        }
    }

    fn finish_from_hook(&mut self, kind: FinishKind, ctx: &mut EventContext<'_>) {
        let decision = if kind.successful() {
            self.behavior.on_success(&mut self.core, ctx)
        } else {
            self.behavior.on_failure(&mut self.core, ctx)
        };
        match decision {
            CompletionDecision::CompletedNow => self.set_finished(kind),
            CompletionDecision::CompletionDeferred => {
                // Terminal state now; the behavior owes a request_finish.
                self.core.state = if kind.successful() {
                    EventState::Succeeded
                } else {
                    EventState::Failed
                };
                self.core.deferred_since = Some(self.core.life_time);
            }
        }
    }

    /// Terminal transition and the single path by which the freeplay
    /// system learns the event ended.
    pub fn set_finished(&mut self, kind: FinishKind) {
        if self.core.finish_announced {
            return;
        }
        self.core.state = if kind.successful() {
            EventState::Succeeded
        } else {
            EventState::Failed
        };
        if kind.successful() {
            self.core.score.points = self.behavior.calculate_point_gain(&self.core);
        }
        self.core.finish_announced = true;
        self.core.deferred_since = None;
        self.core.pending_announcement = Some(kind);
    }

    /// Force-fail without consulting objectives (external cancellation
    /// or fairness timeout).
    pub fn abort(&mut self, kind: FinishKind) {
        debug_assert!(!kind.successful(), "abort cannot succeed an event");
        self.set_finished(kind);
    }

    /// Consume the pending finish announcement, if any.
    pub fn take_announcement(&mut self) -> Option<FinishKind> {
        self.core.pending_announcement.take()
    }

    /// One-time teardown: behavior hook, observers destroyed, entities
    /// disassociated, objectives cleared.
    pub fn shutdown(&mut self, ctx: &mut EventContext<'_>) {
        self.behavior.on_shutdown(&mut self.core, ctx);
        self.core.observers.clear();
        self.core.disassociate_all(ctx.world);
        self.core.objectives.clear();
    }

    /// Associate an entity, then run the overridable behavior hook.
    /// The hook's return mirrors the hook contract: false rejects the
    /// association at the scripting level (the link is kept either way).
    pub fn add_entity_to_event(
        &mut self,
        ctx: &mut EventContext<'_>,
        entity: EntityId,
        reason: SpreadReason,
    ) -> bool {
        let new_reason = self.core.associate_entity(ctx.world, entity, reason);
        self.behavior
            .add_entity(&mut self.core, ctx, entity, reason, new_reason)
    }

    /// Dispatch one bus message to every matching observer. Observers
    /// added during dispatch are kept; removals requested during
    /// dispatch are deferred and flushed afterwards.
    pub fn dispatch_message(&mut self, ctx: &mut EventContext<'_>, msg: &Message) {
        let mut slots = self.core.observers.take_slots();
        for slot in &mut slots {
            if !slot.matches(msg) || self.core.observers.is_marked_removed(&slot.key) {
                continue;
            }
            let flow = slot
                .observer
                .on_message(&mut self.core, self.behavior.as_mut(), ctx, msg);
            if flow == ObserverFlow::Remove {
                self.core.observers.mark_removed(slot.key);
            }
        }
        self.core.observers.restore_slots(slots);
        self.core.flush_observer_removals();
    }

    /// The entity a camera should focus for this event.
    pub fn focus_entity(&self, world: &World) -> Option<EntityId> {
        self.behavior.focus_entity(&self.core, world)
    }

    /// Post-load hook: rewrite entity back-references and let the
    /// behavior re-wire its runtime state (observers).
    pub fn restore(&mut self, ctx: &mut EventContext<'_>) {
        self.core.restore_links(ctx.world);
        self.behavior.on_restore(&mut self.core, ctx);
    }

    fn warn_if_lingering(&mut self, ctx: &mut EventContext<'_>) {
        if self.core.finish_announced || self.core.lingering_warned {
            return;
        }
        if let Some(since) = self.core.deferred_since {
            if self.core.life_time - since > DEFERRED_FINISH_WARN_SECS {
                self.core.lingering_warned = true;
                ctx.notices.push(FreeplayNotice::Alert {
                    level: NoticeLevel::Warning,
                    message: format!(
                        "event {} ('{}') is lingering in a terminal state without informing the system",
                        self.core.id, self.core.display_name
                    ),
                    tick: ctx.time.tick,
                });
            }
        }
    }
}
