//! The freeplay system: the tick-driven orchestrator tying pools,
//! factories, the registry, the message bus, and scoring together.
//!
//! The embedding game loop calls [`FreeplaySystem::update`] once per
//! tick and drains the notice feed afterwards. Everything else —
//! triggering, aborting, pool changes — arrives through the command
//! queue and is processed at the next tick boundary, the same way the
//! rest of the engine handles player input.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hecs::World;
use serde::{Deserialize, Serialize};

use callout_core::commands::FreeplayCommand;
use callout_core::constants::EVENT_DENSITY_LIMIT;
use callout_core::enums::NoticeLevel;
use callout_core::notices::FreeplayNotice;
use callout_core::types::{EventId, SimTime};

use crate::event::FinishKind;
use crate::factory::{split_path, EventFactory};
use crate::messages::{Message, MessageBus};
use crate::registry::{EventRegistry, FinishedEvent};

/// Session-wide score tally across finished events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub total_points: i32,
    pub events_won: u32,
    pub events_lost: u32,
    pub events_aborted: u32,
    pub events_timed_out: u32,
}

pub struct FreeplaySystem {
    pub(crate) registry: EventRegistry,
    pub(crate) bus: MessageBus,
    /// Active pool names; only factories under an active pool may trigger.
    pub(crate) pools: BTreeSet<String>,
    /// Factories keyed by `"pool/name"`.
    pub(crate) factories: BTreeMap<String, Box<dyn EventFactory>>,
    commands: VecDeque<FreeplayCommand>,
    pub(crate) notices: Vec<FreeplayNotice>,
    pub(crate) time: SimTime,
    pub(crate) score: ScoreBoard,
    /// Cross-event force-fail requests raised from hooks, honored after
    /// the loop that raised them has completed.
    pub(crate) abort_requests: Vec<EventId>,
    pub(crate) last_factory: Option<String>,
}

impl Default for FreeplaySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FreeplaySystem {
    pub fn new() -> Self {
        Self {
            registry: EventRegistry::new(),
            bus: MessageBus::default(),
            pools: BTreeSet::new(),
            factories: BTreeMap::new(),
            commands: VecDeque::new(),
            notices: Vec::new(),
            time: SimTime::default(),
            score: ScoreBoard::default(),
            abort_requests: Vec::new(),
            last_factory: None,
        }
    }

    // --- configuration ---

    /// Register a factory at `"pool/name"`. Replaces any previous
    /// factory at the same path.
    pub fn register_factory(&mut self, path: &str, factory: Box<dyn EventFactory>) {
        debug_assert!(split_path(path).is_some(), "factory path must be pool/name");
        self.factories.insert(path.to_string(), factory);
    }

    pub fn set_pools<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.pools = names.into_iter().collect();
    }

    pub fn add_pool(&mut self, name: &str) {
        self.pools.insert(name.to_string());
    }

    pub fn remove_pool(&mut self, name: &str) {
        self.pools.remove(name);
    }

    pub fn pool_active(&self, name: &str) -> bool {
        self.pools.contains(name)
    }

    // --- input ---

    pub fn queue_command(&mut self, command: FreeplayCommand) {
        self.commands.push_back(command);
    }

    /// Publish a game message; dispatched to observers next tick.
    pub fn publish(&mut self, msg: Message) {
        self.bus.publish(msg);
    }

    // --- accessors ---

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Combined density of all active events.
    pub fn density(&self) -> f32 {
        self.registry.active_density()
    }

    /// Drain the notice feed accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<FreeplayNotice> {
        std::mem::take(&mut self.notices)
    }

    // --- triggering ---

    /// Trigger the event behind `"pool/name"` right now, bypassing the
    /// command queue. Refusals are reported in the notice feed as well
    /// as in the returned error.
    pub fn trigger_event_by_path(&mut self, world: &mut World, path: &str) -> Result<EventId, String> {
        match self.try_trigger_path(world, path) {
            Ok(id) => Ok(id),
            Err(reason) => {
                self.notices.push(FreeplayNotice::EventRefused {
                    path: path.to_string(),
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }

    /// Re-trigger through the factory that produced the most recent event.
    pub fn trigger_last_event(&mut self, world: &mut World) -> Result<EventId, String> {
        let Some(path) = self.last_factory.clone() else {
            return Err("no event has been triggered yet".to_string());
        };
        self.trigger_event_by_path(world, &path)
    }

    fn try_trigger_path(&mut self, world: &mut World, path: &str) -> Result<EventId, String> {
        let (pool, _) = split_path(path).ok_or_else(|| format!("malformed event path '{path}'"))?;
        if !self.pools.contains(pool) {
            return Err(format!("pool '{pool}' is not active"));
        }
        let factory = self
            .factories
            .get_mut(path)
            .ok_or_else(|| format!("no factory registered at '{path}'"))?;

        let mut event = factory.try_trigger(world)?;
        event.core_mut().factory_path = path.to_string();

        if !event.check_configuration() {
            return Err("event configuration check failed".to_string());
        }

        let density = self.registry.active_density() + event.core().density;
        if density > EVENT_DENSITY_LIMIT {
            return Err(format!(
                "event density limit reached ({density:.2} > {EVENT_DENSITY_LIMIT:.2})"
            ));
        }

        let id = self
            .registry
            .insert_event(world, self.time, &mut self.notices, &mut self.abort_requests, event)
            .ok_or_else(|| "event startup refused".to_string())?;
        self.last_factory = Some(path.to_string());
        Ok(id)
    }

    /// Force-fail an event, bypassing its objectives.
    pub fn abort_event(&mut self, event_id: EventId) -> Result<(), String> {
        let record = self
            .registry
            .abort_event(event_id, FinishKind::Aborted, &mut self.notices);
        match record {
            Some(record) => {
                self.apply_settlement(&record);
                Ok(())
            }
            None => Err(format!("event {event_id} is unknown or already finished")),
        }
    }

    /// Surface a Hidden event immediately, bypassing whatever surfacing
    /// condition its behavior scripts.
    pub fn surface_event(&mut self, world: &mut World, event_id: EventId) -> Result<(), String> {
        if self.registry.surface_event(
            event_id,
            world,
            self.time,
            &mut self.notices,
            &mut self.abort_requests,
        ) {
            Ok(())
        } else {
            Err(format!("event {event_id} is unknown"))
        }
    }

    /// Freeze or unfreeze one event's life/running time and timers.
    pub fn set_event_paused(&mut self, event_id: EventId, paused: bool) -> Result<(), String> {
        let event = self
            .registry
            .get_mut(event_id)
            .ok_or_else(|| format!("event {event_id} is unknown"))?;
        event.core_mut().set_time_paused(paused);
        Ok(())
    }

    // --- tick ---

    /// Advance the freeplay system by one tick.
    pub fn update(&mut self, world: &mut World) {
        self.time.advance();
        let time = self.time;
        let dt = time.dt();

        self.process_commands(world);

        // Drain the bus before the update pass so observer-driven
        // objective progress and the win/loss evaluation that follows it
        // land in the same tick.
        while let Some(msg) = self.bus.pop() {
            self.registry.dispatch_message(
                world,
                time,
                &mut self.notices,
                &mut self.abort_requests,
                &msg,
            );
        }

        let mut finished =
            self.registry
                .update_events(world, dt, time, &mut self.notices, &mut self.abort_requests);

        // Fairness timeout: events that never surfaced are force-failed.
        for event_id in self.registry.timeout_candidates() {
            if let Some(record) =
                self.registry
                    .abort_event(event_id, FinishKind::TimedOut, &mut self.notices)
            {
                finished.push(record);
            }
        }

        // Cross-event aborts raised from hooks, including chains where
        // an abort hook raises further aborts.
        while !self.abort_requests.is_empty() {
            let requests = std::mem::take(&mut self.abort_requests);
            for event_id in requests {
                if let Some(record) =
                    self.registry
                        .abort_event(event_id, FinishKind::Aborted, &mut self.notices)
                {
                    finished.push(record);
                }
            }
        }

        self.registry
            .flush_removed(world, time, &mut self.notices, &mut self.abort_requests);

        for record in &finished {
            self.apply_settlement(record);
        }
    }

    fn apply_settlement(&mut self, record: &FinishedEvent) {
        match record.kind {
            FinishKind::Won => {
                self.score.total_points += record.points;
                self.score.events_won += 1;
            }
            FinishKind::Lost => self.score.events_lost += 1,
            FinishKind::Aborted => self.score.events_aborted += 1,
            FinishKind::TimedOut => self.score.events_timed_out += 1,
        }
    }

    fn process_commands(&mut self, world: &mut World) {
        while let Some(command) = self.commands.pop_front() {
            self.handle_command(world, command);
        }
    }

    fn handle_command(&mut self, world: &mut World, command: FreeplayCommand) {
        match command {
            FreeplayCommand::TriggerEvent { path } => {
                // Refusals are already reported through the notice feed.
                let _ = self.trigger_event_by_path(world, &path);
            }
            FreeplayCommand::TriggerLastEvent => {
                if let Err(reason) = self.trigger_last_event(world) {
                    self.push_alert(reason);
                }
            }
            FreeplayCommand::AbortEvent { event_id } => {
                if let Err(reason) = self.abort_event(event_id) {
                    self.push_alert(reason);
                }
            }
            FreeplayCommand::SetEventPools { names } => {
                self.set_pools(split_names(&names));
            }
            FreeplayCommand::AddEventPools { names } => {
                for name in split_names(&names) {
                    self.pools.insert(name);
                }
            }
            FreeplayCommand::RemoveEventPools { names } => {
                for name in split_names(&names) {
                    self.pools.remove(&name);
                }
            }
            FreeplayCommand::SetEventPaused { event_id, paused } => {
                if let Err(reason) = self.set_event_paused(event_id, paused) {
                    self.push_alert(reason);
                }
            }
        }
    }

    fn push_alert(&mut self, message: String) {
        self.notices.push(FreeplayNotice::Alert {
            level: NoticeLevel::Warning,
            message,
            tick: self.time.tick,
        });
    }
}

fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
