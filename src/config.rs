//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "timer-service")]
#[command(about = "Run up to five countdown timers from an interactive console")]
#[command(version)]
pub struct Config {
    /// Directory holding the preset library
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["timer-service"]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn overrides() {
        let config =
            Config::try_parse_from(["timer-service", "-d", "/tmp/timers", "--tick-ms", "250", "-v"])
                .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/timers"));
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn rejects_tiny_tick() {
        assert!(Config::try_parse_from(["timer-service", "--tick-ms", "1"]).is_err());
    }
}
