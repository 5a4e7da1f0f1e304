//! Console response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{Preset, Timer, TimerId, TimerState},
    utils::format_clock,
};

/// Display form of a timer snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub id: TimerId,
    pub name: String,
    pub state: TimerState,
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub remaining: String,
    pub progress: u8,
}

impl From<&Timer> for TimerView {
    fn from(timer: &Timer) -> Self {
        Self {
            id: timer.id,
            name: timer.name.clone(),
            state: timer.state,
            elapsed_secs: timer.elapsed_secs,
            total_secs: timer.total_secs,
            remaining: format_clock(timer.remaining_secs()),
            progress: timer.progress(),
        }
    }
}

/// Response printed for every console command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub timers: Vec<TimerView>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub presets: Vec<Preset>,
}

impl ConsoleResponse {
    /// Create a new console response
    pub fn new(status: &str, message: String) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timers: Vec::new(),
            presets: Vec::new(),
        }
    }

    /// Create a success response
    pub fn ok(message: String) -> Self {
        Self::new("ok", message)
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error", message)
    }

    pub fn with_timers<'a>(mut self, timers: impl IntoIterator<Item = &'a Timer>) -> Self {
        self.timers = timers.into_iter().map(TimerView::from).collect();
        self
    }

    pub fn with_presets(mut self, presets: Vec<Preset>) -> Self {
        self.presets = presets;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Render as a single JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"status":"error","message":"{}"}}"#, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_view_renders_remaining_time() {
        let mut timer = Timer::new(TimerId(1), "Tea".to_string(), 300);
        timer.elapsed_secs = 60;
        let view = TimerView::from(&timer);
        assert_eq!(view.remaining, "00:04:00");
        assert_eq!(view.progress, 20);
    }

    #[test]
    fn empty_lists_are_omitted() {
        let json = ConsoleResponse::ok("done".to_string()).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
        assert!(value.get("timers").is_none());
        assert!(value.get("presets").is_none());
    }
}
