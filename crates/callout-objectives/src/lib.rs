//! Objective engine for CALLOUT freeplay events.
//!
//! Pure data and accounting logic: a single win/fail condition
//! (`Objective`) and the per-event collection that evaluates success and
//! failure (`ObjectiveList`). No ECS dependency — entity liveness is
//! injected as a predicate.

pub mod list;
pub mod record;

pub use list::{ObjectiveIds, ObjectiveList};
pub use record::Objective;

#[cfg(test)]
mod tests;
