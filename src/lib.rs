//! Timer Service - a bounded set of concurrent countdown timers
//! 
//! This library manages up to five independent countdown timers, each ticked
//! by its own worker thread, plus a persistent library of named presets.

pub mod config;
pub mod console;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{StoreError, TimerError};
pub use services::{ChannelSink, Completion, CompletionSink, FilePresetStore, MemoryPresetStore, PresetStore};
pub use state::{Preset, Timer, TimerId, TimerRegistry, TimerState, MAX_TIMERS};
pub use utils::shutdown_signal;
