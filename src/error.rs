//! Error types for registry operations and preset persistence

use thiserror::Error;

use crate::state::TimerId;

/// Errors returned by [`crate::TimerRegistry`] operations
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Timer {0} not found")]
    TimerNotFound(TimerId),

    #[error("Preset '{0}' not found")]
    PresetNotFound(String),

    #[error("Maximum number of timers ({max}) reached")]
    CapacityExceeded { max: usize },

    #[error("Timer {0} is already running")]
    AlreadyRunning(TimerId),

    #[error("Timer {0} is not running")]
    NotRunning(TimerId),

    #[error("Timer service has been shut down")]
    ServiceStopped,

    #[error("Failed to spawn timer worker: {0}")]
    WorkerSpawn(std::io::Error),
}

/// Errors raised by a preset store while loading or saving the library
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read/write preset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preset record on line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

pub type Result<T, E = TimerError> = std::result::Result<T, E>;
