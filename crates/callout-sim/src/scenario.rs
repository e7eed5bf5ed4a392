//! Demo incident kinds: a rescue callout and a structure fire.
//!
//! These exercise every part of the event machinery — objectives, fail
//! conditions, observers, timers, hints, deferred completion — and are
//! what the end-to-end tests run against. Game logic (units rescuing
//! casualties, hoses extinguishing hazards) stays outside; the behaviors
//! react to bus messages published by the embedding game.

use hecs::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use callout_core::components::{Casualty, Hazard};
use callout_core::enums::{CompletionDecision, EventState, SpreadReason};
use callout_core::types::{EntityId, MessageId, ObjectiveTypeId, ObserverTypeId, TimerId, MAP_SCOPE};

use crate::behavior::EventBehavior;
use crate::event::{EventContext, EventCore, FreeplayEvent};
use crate::factory::EventFactory;
use crate::observer::CountOnMessage;
use crate::system::FreeplaySystem;

// Bus message IDs published by the embedding game.
pub const MSG_CASUALTY_RESCUED: MessageId = 1001;
pub const MSG_CASUALTY_LOST: MessageId = 1002;
pub const MSG_HAZARD_EXTINGUISHED: MessageId = 1101;

// Objective type IDs.
pub const OBJ_RESCUE_ALL_CASUALTIES: ObjectiveTypeId = 1;
pub const OBJ_CASUALTIES_LOST: ObjectiveTypeId = 2;
pub const OBJ_EXTINGUISH_ALL: ObjectiveTypeId = 3;
pub const OBJ_BUILDING_COLLAPSED: ObjectiveTypeId = 4;

// Observer type IDs.
pub const OBS_CASUALTY_RESCUED: ObserverTypeId = 1;
pub const OBS_CASUALTY_LOST: ObserverTypeId = 2;
pub const OBS_HAZARD_EXTINGUISHED: ObserverTypeId = 3;

// Timer IDs (private to each event).
pub const TIMER_COLLAPSE: TimerId = 1;
pub const TIMER_ENDING: TimerId = 2;

pub const RESCUE_INCIDENT_PATH: &str = "rescue/traffic_accident";
pub const STRUCTURE_FIRE_PATH: &str = "fire/apartment_fire";

/// Spawn `count` casualties and return their entity IDs.
pub fn spawn_casualties(world: &mut World, rng: &mut ChaCha8Rng, count: u32) -> Vec<EntityId> {
    (0..count)
        .map(|_| {
            world
                .spawn((Casualty {
                    health: rng.gen_range(30.0..80.0),
                    rescued: false,
                },))
                .to_bits()
                .get()
        })
        .collect()
}

/// Spawn `count` hazards and return their entity IDs.
pub fn spawn_hazards(world: &mut World, rng: &mut ChaCha8Rng, count: u32) -> Vec<EntityId> {
    (0..count)
        .map(|_| {
            world
                .spawn((Hazard {
                    intensity: rng.gen_range(0.5..1.5),
                },))
                .to_bits()
                .get()
        })
        .collect()
}

fn wire_casualty_observers(core: &mut EventCore) {
    core.add_observer(
        OBS_CASUALTY_RESCUED,
        MAP_SCOPE,
        MSG_CASUALTY_RESCUED,
        Box::new(CountOnMessage::new(OBJ_RESCUE_ALL_CASUALTIES)),
    );
    core.add_observer(
        OBS_CASUALTY_LOST,
        MAP_SCOPE,
        MSG_CASUALTY_LOST,
        Box::new(CountOnMessage::new(OBJ_CASUALTIES_LOST)),
    );
}

/// A callout with trapped casualties: rescue everyone, losing too many
/// fails the event. Surfaces immediately.
pub struct RescueIncident {
    pub casualties: u32,
    /// How many lost casualties fail the event.
    pub lose_limit: u32,
    rng: ChaCha8Rng,
}

impl RescueIncident {
    pub fn new(casualties: u32, lose_limit: u32, seed: u64) -> Self {
        Self {
            casualties,
            lose_limit,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl EventBehavior for RescueIncident {
    fn check_configuration(&self, _core: &EventCore) -> bool {
        self.casualties > 0 && self.lose_limit > 0
    }

    fn on_startup(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) -> bool {
        let spawned = spawn_casualties(ctx.world, &mut self.rng, self.casualties);
        for &entity in &spawned {
            core.associate_entity(ctx.world, entity, SpreadReason::Injury);
        }

        let rescue = core.add_objective(OBJ_RESCUE_ALL_CASUALTIES, ctx.objective_ids);
        rescue.text = "Rescue all casualties".to_string();
        for &entity in &spawned {
            rescue.increase_needed_number(Some(entity));
        }

        let lost = core.add_fail_condition(OBJ_CASUALTIES_LOST, ctx.objective_ids);
        lost.text = "Casualties lost".to_string();
        lost.set_needed_number(self.lose_limit);

        wire_casualty_observers(core);
        core.objective_points.insert(OBJ_RESCUE_ALL_CASUALTIES, 150);
        core.request_run();
        true
    }

    fn calculate_point_gain(&self, core: &EventCore) -> i32 {
        // Losing casualties below the fail limit still costs points.
        let lost = core
            .objectives
            .get(OBJ_CASUALTIES_LOST)
            .map(|o| o.current_number)
            .unwrap_or(0);
        (core.score.points - 25 * lost as i32).max(0)
    }

    fn on_restore(&mut self, core: &mut EventCore, _ctx: &mut EventContext<'_>) {
        wire_casualty_observers(core);
    }
}

/// A burning building: extinguish every hazard before it collapses.
/// Stays hidden until reported; a loss plays a scripted ending before
/// the event informs the system it finished.
pub struct StructureFire {
    pub hazards: u32,
    /// Seconds between startup and the incident being reported (surfacing).
    pub report_delay_secs: f64,
    /// Seconds until the building collapses.
    pub collapse_deadline_secs: f64,
    /// Length of the scripted ending after a loss.
    pub ending_delay_secs: f64,
    rng: ChaCha8Rng,
}

impl StructureFire {
    pub fn new(
        hazards: u32,
        report_delay_secs: f64,
        collapse_deadline_secs: f64,
        ending_delay_secs: f64,
        seed: u64,
    ) -> Self {
        Self {
            hazards,
            report_delay_secs,
            collapse_deadline_secs,
            ending_delay_secs,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn wire_observers(core: &mut EventCore) {
        core.add_observer(
            OBS_HAZARD_EXTINGUISHED,
            MAP_SCOPE,
            MSG_HAZARD_EXTINGUISHED,
            Box::new(CountOnMessage::new(OBJ_EXTINGUISH_ALL).remove_when_accomplished()),
        );
    }
}

impl EventBehavior for StructureFire {
    fn check_configuration(&self, _core: &EventCore) -> bool {
        self.hazards > 0 && self.collapse_deadline_secs > 0.0
    }

    fn on_startup(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) -> bool {
        let spawned = spawn_hazards(ctx.world, &mut self.rng, self.hazards);
        for &entity in &spawned {
            core.associate_entity(ctx.world, entity, SpreadReason::Fire);
        }

        let extinguish = core.add_objective(OBJ_EXTINGUISH_ALL, ctx.objective_ids);
        extinguish.text = "Extinguish all fires".to_string();
        for &entity in &spawned {
            extinguish.increase_needed_number(Some(entity));
        }

        let collapsed = core.add_fail_condition(OBJ_BUILDING_COLLAPSED, ctx.objective_ids);
        collapsed.text = "The building collapsed".to_string();
        collapsed.set_needed_number(1);

        Self::wire_observers(core);
        core.start_timer(ctx.game_timer_ids, TIMER_COLLAPSE, self.collapse_deadline_secs);
        true
    }

    fn update(&mut self, core: &mut EventCore, _ctx: &mut EventContext<'_>, _dt: f64) {
        if core.state == EventState::Hidden && core.life_time >= self.report_delay_secs {
            core.request_run();
        }
    }

    fn on_run(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) {
        core.show_hint("structure_fire_reported", true, ctx.notices);
    }

    fn on_timer_triggered(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>, timer: TimerId) {
        match timer {
            TIMER_COLLAPSE => {
                if let Some(collapsed) = core.objectives.get_mut(OBJ_BUILDING_COLLAPSED) {
                    collapsed.set_accomplished();
                }
                core.show_hint("building_collapsed", true, ctx.notices);
            }
            TIMER_ENDING => {
                // Scripted ending finished playing out.
                core.request_finish(false);
            }
            _ => {}
        }
    }

    fn on_failure(&mut self, core: &mut EventCore, ctx: &mut EventContext<'_>) -> CompletionDecision {
        core.cancel_timer(TIMER_COLLAPSE);
        core.start_timer(ctx.game_timer_ids, TIMER_ENDING, self.ending_delay_secs);
        CompletionDecision::CompletionDeferred
    }

    fn on_success(&mut self, core: &mut EventCore, _ctx: &mut EventContext<'_>) -> CompletionDecision {
        core.cancel_timer(TIMER_COLLAPSE);
        CompletionDecision::CompletedNow
    }

    fn on_restore(&mut self, core: &mut EventCore, _ctx: &mut EventContext<'_>) {
        // Timers and objectives are part of the saved core; only the
        // observers need re-wiring.
        if !core
            .objectives
            .get(OBJ_EXTINGUISH_ALL)
            .map(|o| o.check_accomplished())
            .unwrap_or(true)
        {
            Self::wire_observers(core);
        }
    }
}

/// Factory for [`RescueIncident`] events with deterministic per-trigger
/// seeding.
pub struct RescueIncidentFactory {
    seed: u64,
    triggered: u64,
}

impl RescueIncidentFactory {
    pub fn new(seed: u64) -> Self {
        Self { seed, triggered: 0 }
    }
}

impl EventFactory for RescueIncidentFactory {
    fn try_trigger(&mut self, _world: &mut World) -> Result<FreeplayEvent, String> {
        let seed = self.seed.wrapping_add(self.triggered);
        self.triggered += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let casualties = rng.gen_range(2..=4);
        Ok(FreeplayEvent::new(
            Box::new(RescueIncident::new(casualties, 2, seed)),
            RESCUE_INCIDENT_PATH,
            "Traffic Accident",
        ))
    }

    fn restore_behavior(&self) -> Box<dyn EventBehavior> {
        Box::new(RescueIncident::new(0, 2, self.seed))
    }
}

/// Factory for [`StructureFire`] events.
pub struct StructureFireFactory {
    seed: u64,
    triggered: u64,
}

impl StructureFireFactory {
    pub fn new(seed: u64) -> Self {
        Self { seed, triggered: 0 }
    }
}

impl EventFactory for StructureFireFactory {
    fn try_trigger(&mut self, _world: &mut World) -> Result<FreeplayEvent, String> {
        let seed = self.seed.wrapping_add(self.triggered);
        self.triggered += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let hazards = rng.gen_range(2..=5);
        let mut event = FreeplayEvent::new(
            Box::new(StructureFire::new(hazards, 5.0, 300.0, 10.0, seed)),
            STRUCTURE_FIRE_PATH,
            "Apartment Fire",
        );
        event.core_mut().density = 1.5;
        Ok(event)
    }

    fn restore_behavior(&self) -> Box<dyn EventBehavior> {
        Box::new(StructureFire::new(0, 5.0, 300.0, 10.0, self.seed))
    }
}

/// Register the demo factories and activate their pools.
pub fn standard_pools(system: &mut FreeplaySystem, seed: u64) {
    system.register_factory(RESCUE_INCIDENT_PATH, Box::new(RescueIncidentFactory::new(seed)));
    system.register_factory(STRUCTURE_FIRE_PATH, Box::new(StructureFireFactory::new(seed ^ 1)));
    system.add_pool("rescue");
    system.add_pool("fire");
}
