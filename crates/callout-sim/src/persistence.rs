//! Saving and restoring the freeplay system.
//!
//! The save covers freeplay state only: time, score, pools, allocator
//! cursors, and the serializable core of every live event. The world
//! itself is saved and restored by the embedder; stale entity references
//! in a loaded save are recovered fail-open so no objective can become
//! permanently unwinnable. Behaviors are trait objects and are not
//! serialized — each saved core records the `"pool/name"` path of the
//! factory that produced it, and restoring re-binds a behavior through
//! that factory.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use hecs::World;
use serde::{Deserialize, Serialize};

use callout_core::notices::FreeplayNotice;
use callout_core::types::{EventId, GameTimerId, SimTime};
use callout_objectives::ObjectiveIds;

use crate::event::{EventContext, EventCore, FreeplayEvent, GameTimerIds};
use crate::registry::EventRegistry;
use crate::system::{FreeplaySystem, ScoreBoard};

pub const SAVE_VERSION: u32 = 1;

/// Borrowing view of the freeplay state, written to disk.
#[derive(Serialize)]
pub struct FreeplaySaveRef<'a> {
    pub version: u32,
    pub time: SimTime,
    pub score: &'a ScoreBoard,
    pub pools: &'a BTreeSet<String>,
    pub last_factory: &'a Option<String>,
    pub next_event_id: EventId,
    pub next_objective_id: u32,
    pub next_game_timer_id: GameTimerId,
    pub events: Vec<&'a EventCore>,
}

/// Owned counterpart of [`FreeplaySaveRef`], read back from disk.
#[derive(Deserialize)]
pub struct FreeplaySave {
    pub version: u32,
    pub time: SimTime,
    pub score: ScoreBoard,
    pub pools: BTreeSet<String>,
    pub last_factory: Option<String>,
    pub next_event_id: EventId,
    pub next_objective_id: u32,
    pub next_game_timer_id: GameTimerId,
    pub events: Vec<EventCore>,
}

fn save_path(dir: &Path, slot: &str) -> std::path::PathBuf {
    dir.join(format!("{}.json", slot))
}

pub fn save_to_file(dir: &Path, slot: &str, save: &FreeplaySaveRef<'_>) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create save directory: {e}"))?;
    let path = save_path(dir, slot);
    let json = serde_json::to_string_pretty(save)
        .map_err(|e| format!("Failed to serialize save data: {e}"))?;
    fs::write(&path, json).map_err(|e| format!("Failed to write save file: {e}"))?;
    Ok(())
}

pub fn load_from_file(dir: &Path, slot: &str) -> Result<FreeplaySave, String> {
    let path = save_path(dir, slot);
    let json = fs::read_to_string(&path).map_err(|e| format!("Failed to read save file: {e}"))?;
    let save: FreeplaySave =
        serde_json::from_str(&json).map_err(|e| format!("Failed to parse save data: {e}"))?;
    Ok(save)
}

impl FreeplaySystem {
    /// Snapshot the freeplay state for serialization.
    pub fn to_save(&self) -> FreeplaySaveRef<'_> {
        FreeplaySaveRef {
            version: SAVE_VERSION,
            time: self.time,
            score: &self.score,
            pools: &self.pools,
            last_factory: &self.last_factory,
            next_event_id: self.registry.event_id_cursor(),
            next_objective_id: self.registry.objective_ids.cursor(),
            next_game_timer_id: self.registry.game_timer_ids.cursor(),
            events: self.registry.iter().map(|e| e.core()).collect(),
        }
    }

    /// Rebuild the freeplay state from a save. Factories must have been
    /// registered beforehand; events whose factory is gone are discarded
    /// with a notice instead of failing the whole load.
    pub fn restore(&mut self, world: &mut World, save: FreeplaySave) -> Result<(), String> {
        if save.version != SAVE_VERSION {
            return Err(format!(
                "Unsupported save version {} (expected {SAVE_VERSION})",
                save.version
            ));
        }

        self.time = save.time;
        self.score = save.score;
        self.pools = save.pools;
        self.last_factory = save.last_factory;

        self.registry = EventRegistry::new();
        self.registry.objective_ids = ObjectiveIds::resume_at(save.next_objective_id);
        self.registry.game_timer_ids = GameTimerIds::resume_at(save.next_game_timer_id);
        self.registry.resume_event_ids(save.next_event_id);

        for mut core in save.events {
            if core.state.is_finished() {
                self.notices.push(FreeplayNotice::EventDiscarded {
                    name: core.display_name.clone(),
                    reason: "saved in a terminal state".to_string(),
                });
                continue;
            }
            let Some(factory) = self.factories.get(&core.factory_path) else {
                self.notices.push(FreeplayNotice::EventDiscarded {
                    name: core.display_name.clone(),
                    reason: format!("no factory registered at '{}'", core.factory_path),
                });
                continue;
            };
            let behavior = factory.restore_behavior();

            // Needed entities that did not survive the world restore are
            // counted as fulfilled; the recovery itself awards no points.
            core.objectives
                .fulfill_nonexisting_needed_entities(|id| {
                    hecs::Entity::from_bits(id)
                        .map(|e| world.contains(e))
                        .unwrap_or(false)
                });
            let _ = core.objectives.drain_progress();

            let mut event = FreeplayEvent::from_parts(core, behavior);
            let mut ctx = EventContext {
                world: &mut *world,
                objective_ids: &mut self.registry.objective_ids,
                game_timer_ids: &mut self.registry.game_timer_ids,
                notices: &mut self.notices,
                abort_requests: &mut self.abort_requests,
                time: self.time,
            };
            event.restore(&mut ctx);
            self.registry.insert_restored(event);
        }
        Ok(())
    }
}
