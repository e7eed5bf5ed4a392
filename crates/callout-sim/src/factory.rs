//! Event factories.
//!
//! A factory lives at a `"pool/name"` path and produces one configured
//! `FreeplayEvent` per trigger. Triggering may fail for scenario-side
//! reasons (no suitable location, missing prerequisites); the error
//! string becomes the refusal reason in the notice feed.

use hecs::World;

use crate::behavior::{DefaultBehavior, EventBehavior};
use crate::event::FreeplayEvent;

pub trait EventFactory {
    /// Build a fresh, not-yet-registered event, spawning whatever
    /// entities the incident needs.
    fn try_trigger(&mut self, world: &mut World) -> Result<FreeplayEvent, String>;

    /// A behavior suitable for re-binding a saved event core produced by
    /// this factory. Factories whose behavior carries no configuration
    /// can rely on the default.
    fn restore_behavior(&self) -> Box<dyn EventBehavior> {
        Box::new(DefaultBehavior)
    }
}

/// Split `"pool/name"` into its two components.
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    let (pool, name) = path.split_once('/')?;
    if pool.is_empty() || name.is_empty() {
        return None;
    }
    Some((pool, name))
}
