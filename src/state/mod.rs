//! State management module
//! 
//! This module contains the timer and preset data model and the registry that owns them.

pub mod preset;
pub mod registry;
pub mod timer;

// Re-export main types
pub use preset::Preset;
pub use registry::{TimerRegistry, DEFAULT_TICK, MAX_TIMERS};
pub use timer::{Timer, TimerId, TimerState};
