//! Named, reusable timer durations

use serde::{Deserialize, Serialize};

/// A named duration used to quickly create new timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub secs: u64,
}

impl Preset {
    pub fn new(name: impl Into<String>, secs: u64) -> Self {
        Self {
            name: name.into(),
            secs,
        }
    }

    /// Library used the first time no persisted presets are found
    pub fn defaults() -> Vec<Preset> {
        vec![
            Preset::new("Quick Timer", 60),
            Preset::new("5 Minutes", 300),
            Preset::new("10 Minutes", 600),
            Preset::new("30 Minutes", 1800),
        ]
    }
}

/// Insert or overwrite by name. Returns true when an existing entry was replaced.
pub(crate) fn upsert(presets: &mut Vec<Preset>, name: &str, secs: u64) -> bool {
    match presets.iter_mut().find(|p| p.name == name) {
        Some(existing) => {
            existing.secs = secs;
            true
        }
        None => {
            presets.push(Preset::new(name, secs));
            false
        }
    }
}
