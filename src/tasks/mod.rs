//! Background tasks module
//! 
//! This module contains the worker threads that tick running timers.

pub mod worker;

// Re-export main types
pub use worker::TimerWorker;
