//! Console command parsing and dispatch

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use super::responses::ConsoleResponse;
use crate::{
    error::TimerError,
    state::{TimerId, TimerRegistry},
};

#[derive(Parser, Debug)]
#[command(name = "timer", no_binary_name = true, disable_version_flag = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: Command,
}

/// One console command
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a timer
    Create { name: String, secs: u64 },
    /// Create a timer from a saved preset
    Preset { name: String },
    Start { id: u32 },
    Pause { id: u32 },
    Resume { id: u32 },
    Stop { id: u32 },
    Delete { id: u32 },
    /// Show one timer
    Show { id: u32 },
    /// Show all timers
    List,
    /// Show saved presets
    Presets,
    /// Save or overwrite a preset
    Save { name: String, secs: u64 },
    /// Delete a preset
    Forget { name: String },
    /// Shut down and exit
    #[command(alias = "exit")]
    Quit,
}

impl Command {
    /// Parse a shell-quoted console line. Errors carry clap's usage text.
    pub fn parse(line: &str) -> Result<Command, String> {
        let args = shlex::split(line).ok_or("error: Invalid quoting")?;
        let parsed = ConsoleLine::try_parse_from(args).map_err(|e| e.to_string())?;
        Ok(parsed.command)
    }

    /// Commands that may wait for a worker thread to exit
    pub fn blocks(&self) -> bool {
        matches!(self, Command::Stop { .. } | Command::Delete { .. })
    }
}

/// Run a command against the registry
pub fn execute(registry: &TimerRegistry, command: Command) -> ConsoleResponse {
    debug!("Executing console command: {:?}", command);

    let result = match command {
        Command::Create { name, secs } => registry
            .create_timer(name, secs)
            .map(|id| with_timer(registry, id, format!("Timer {} created", id))),
        Command::Preset { name } => registry
            .create_timer_from_predefined(&name)
            .map(|id| with_timer(registry, id, format!("Timer {} created from '{}'", id, name))),
        Command::Start { id } => {
            let id = TimerId(id);
            registry
                .start_timer(id)
                .map(|_| with_timer(registry, id, format!("Timer {} started", id)))
        }
        Command::Pause { id } => {
            let id = TimerId(id);
            registry
                .pause_timer(id)
                .map(|_| with_timer(registry, id, format!("Timer {} paused", id)))
        }
        Command::Resume { id } => {
            let id = TimerId(id);
            registry
                .resume_timer(id)
                .map(|_| with_timer(registry, id, format!("Timer {} resumed", id)))
        }
        Command::Stop { id } => {
            let id = TimerId(id);
            registry
                .stop_timer(id)
                .map(|_| with_timer(registry, id, format!("Timer {} stopped", id)))
        }
        Command::Delete { id } => {
            let id = TimerId(id);
            registry
                .delete_timer(id)
                .map(|_| ConsoleResponse::ok(format!("Timer {} deleted", id)))
        }
        Command::Show { id } => {
            let id = TimerId(id);
            registry
                .get_timer(id)
                .map(|timer| ConsoleResponse::ok(timer.name.clone()).with_timers([&timer]))
                .ok_or(TimerError::TimerNotFound(id))
        }
        Command::List => {
            let timers = registry.get_all_timers();
            Ok(ConsoleResponse::ok(format!("{} timers", timers.len())).with_timers(&timers))
        }
        Command::Presets => {
            let presets = registry.get_predefined_timers();
            Ok(ConsoleResponse::ok(format!("{} presets", presets.len())).with_presets(presets))
        }
        Command::Save { name, secs } => {
            registry.save_predefined_timer(name.clone(), secs);
            Ok(ConsoleResponse::ok(format!("Preset '{}' saved", name))
                .with_presets(registry.get_predefined_timers()))
        }
        Command::Forget { name } => registry
            .delete_predefined_timer(&name)
            .map(|_| ConsoleResponse::ok(format!("Preset '{}' deleted", name))),
        Command::Quit => Ok(ConsoleResponse::ok("Shutting down".to_string())),
    };

    result.unwrap_or_else(|e| {
        warn!("Console command failed: {}", e);
        ConsoleResponse::error(e.to_string())
    })
}

fn with_timer(registry: &TimerRegistry, id: TimerId, message: String) -> ConsoleResponse {
    let response = ConsoleResponse::ok(message);
    match registry.get_timer(id) {
        Some(timer) => response.with_timers([&timer]),
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryPresetStore;
    use test_case::test_case;

    #[test_case("create Tea 180", Command::Create { name: "Tea".into(), secs: 180 }; "create")]
    #[test_case("create \"Green Tea\" 120", Command::Create { name: "Green Tea".into(), secs: 120 }; "quoted name")]
    #[test_case("preset '5 Minutes'", Command::Preset { name: "5 Minutes".into() }; "preset")]
    #[test_case("start 3", Command::Start { id: 3 }; "start")]
    #[test_case("list", Command::List; "list")]
    #[test_case("exit", Command::Quit; "exit alias")]
    fn parses_commands(line: &str, expected: Command) {
        assert_eq!(Command::parse(line).unwrap(), expected);
    }

    #[test_case("create Tea"; "missing seconds")]
    #[test_case("start x"; "bad id")]
    #[test_case("create \"Tea 10"; "bad quoting")]
    #[test_case("launch 1"; "unknown")]
    fn rejects_bad_lines(line: &str) {
        assert!(Command::parse(line).is_err());
    }

    #[test]
    fn only_stop_and_delete_block() {
        assert!(Command::Stop { id: 1 }.blocks());
        assert!(Command::Delete { id: 1 }.blocks());
        assert!(!Command::Start { id: 1 }.blocks());
    }

    #[test]
    fn executes_against_registry() {
        let registry = TimerRegistry::new(MemoryPresetStore::new());

        let created = execute(&registry, Command::Create { name: "Tea".into(), secs: 5 });
        assert!(created.is_ok());
        assert_eq!(created.timers[0].id, TimerId(1));

        let missing = execute(&registry, Command::Pause { id: 9 });
        assert!(!missing.is_ok());
        assert_eq!(missing.message, "Timer 9 not found");

        let presets = execute(&registry, Command::Presets);
        assert_eq!(presets.presets.len(), 4);

        let listed = execute(&registry, Command::List);
        assert_eq!(listed.timers.len(), 1);
        assert_eq!(listed.timers[0].remaining, "00:00:05");
    }
}
