//! Timer entity and its lifecycle state

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry-assigned timer identifier. Allocated monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u32);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl TimerState {
    /// Running or paused, i.e. a worker is bound to the timer
    pub fn is_active(self) -> bool {
        matches!(self, TimerState::Running | TimerState::Paused)
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
            TimerState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// One countdown instance. Values handed out by the registry are snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    pub total_secs: u64,
    pub elapsed_secs: u64,
    pub state: TimerState,
    pub created_at: DateTime<Utc>,
    /// Bumped on every start so a worker from an earlier run can tell it was superseded
    #[serde(skip)]
    pub(crate) run: u64,
}

impl Timer {
    /// Create a new idle timer
    pub fn new(id: TimerId, name: String, total_secs: u64) -> Self {
        Self {
            id,
            name,
            total_secs,
            elapsed_secs: 0,
            state: TimerState::Idle,
            created_at: Utc::now(),
            run: 0,
        }
    }

    /// Running or paused
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Counting right now: running and not paused
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.elapsed_secs)
    }

    /// Completion percentage in `0..=100`, truncated. A zero-length timer reports 0.
    pub fn progress(&self) -> u8 {
        if self.total_secs == 0 {
            return 0;
        }
        let percent = self.elapsed_secs.min(self.total_secs) * 100 / self.total_secs;
        percent as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 0, 0; "zero length")]
    #[test_case(10, 0, 0; "not started")]
    #[test_case(10, 5, 50; "half way")]
    #[test_case(3, 1, 33; "truncates")]
    #[test_case(3, 2, 66; "truncates down")]
    #[test_case(7, 7, 100; "done")]
    fn progress_is_truncated_percentage(total: u64, elapsed: u64, expected: u8) {
        let mut timer = Timer::new(TimerId(1), "t".to_string(), total);
        timer.elapsed_secs = elapsed;
        assert_eq!(timer.progress(), expected);
    }

    #[test]
    fn new_timer_is_idle() {
        let timer = Timer::new(TimerId(4), "Tea".to_string(), 180);
        assert_eq!(timer.state, TimerState::Idle);
        assert_eq!(timer.elapsed_secs, 0);
        assert_eq!(timer.remaining_secs(), 180);
        assert!(!timer.is_active());
    }

    #[test]
    fn paused_is_active_but_not_running() {
        let mut timer = Timer::new(TimerId(1), "Tea".to_string(), 5);
        timer.state = TimerState::Paused;
        assert!(timer.is_active());
        assert!(!timer.is_running());
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&TimerState::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
