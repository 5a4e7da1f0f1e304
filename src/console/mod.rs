//! Interactive console module
//! 
//! This module parses console lines into registry operations and renders the
//! results as JSON responses.

pub mod commands;
pub mod responses;

pub use commands::{execute, Command};
pub use responses::{ConsoleResponse, TimerView};
