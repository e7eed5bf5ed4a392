//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Event lifecycle ---

/// Fairness timeout: an event stuck in Hidden state longer than this is
/// force-failed so other candidates get a chance to surface.
pub const DEFAULT_EVENT_TIMEOUT_SECS: f64 = 1000.0;

/// How long an event may linger in a terminal state with a deferred
/// completion before the system raises a warning notice.
pub const DEFERRED_FINISH_WARN_SECS: f64 = 30.0;

// --- Objectives ---

/// Default display order priority for new objectives (lower sorts first).
pub const DEFAULT_OBJECTIVE_PRIORITY: u32 = 100;

// --- Event density ---

/// Density contribution of a standard event.
pub const DEFAULT_EVENT_DENSITY: f32 = 1.0;

/// Total density budget; triggering is refused once active events would
/// exceed it.
pub const EVENT_DENSITY_LIMIT: f32 = 3.0;

// --- Scoring ---

/// Points awarded per accomplished objective when no per-objective
/// point table entry exists.
pub const DEFAULT_OBJECTIVE_POINTS: i32 = 100;
