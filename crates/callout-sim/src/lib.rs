//! Freeplay event engine for CALLOUT.
//!
//! Owns the incident lifecycle: events are triggered from named pools,
//! run against the hecs world at a fixed tick rate, evaluated for
//! success/failure by their objective lists, and torn down deterministically.

pub mod behavior;
pub mod event;
pub mod factory;
pub mod messages;
pub mod observer;
pub mod persistence;
pub mod registry;
pub mod scenario;
pub mod system;
pub mod util;

pub use callout_core as core;
pub use event::{EventCore, FreeplayEvent};
pub use system::FreeplaySystem;
