//! Preset library persistence

use std::{
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{error::StoreError, state::Preset};

const PRESET_FILE: &str = "predefined_timers.txt";

/// Load/save contract for the preset library
pub trait PresetStore: Send + Sync {
    /// Load the persisted library. An absent library loads as empty.
    fn load(&self) -> Result<Vec<Preset>, StoreError>;

    /// Replace the persisted library with `presets`
    fn save(&self, presets: &[Preset]) -> Result<(), StoreError>;
}

/// Plain-text store: one `name seconds` record per line
#[derive(Debug, Clone)]
pub struct FilePresetStore {
    path: PathBuf,
}

impl FilePresetStore {
    /// Store the library as `predefined_timers.txt` inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PRESET_FILE),
        }
    }

    /// Get the preset file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PresetStore for FilePresetStore {
    fn load(&self) -> Result<Vec<Preset>, StoreError> {
        if !self.path.exists() {
            debug!("No preset file at {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut presets = Vec::new();
        let mut first_error = None;
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(index + 1, line) {
                Ok(preset) => presets.push(preset),
                Err(e) => {
                    warn!("Skipping preset record: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        // Records present but none readable: not the same thing as an empty library.
        if let (true, Some(e)) = (presets.is_empty(), first_error) {
            return Err(e);
        }

        info!("Loaded {} presets from {}", presets.len(), self.path.display());
        Ok(presets)
    }

    fn save(&self, presets: &[Preset]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content: String = presets
            .iter()
            .map(|p| format!("{} {}\n", encode_name(&p.name), p.secs))
            .collect();
        fs::write(&self.path, content)?;

        debug!("Saved {} presets to {}", presets.len(), self.path.display());
        Ok(())
    }
}

/// Escape a name so it survives as the leading field of one line.
///
/// Backslashes and line breaks are always escaped, whitespace only at either
/// end (where parsing would trim it). An empty name is written as `\e`.
fn encode_name(name: &str) -> String {
    if name.is_empty() {
        return "\\e".to_string();
    }

    let last = name.chars().count() - 1;
    let mut encoded = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let edge = i == 0 || i == last;
        match c {
            '\\' => encoded.push_str("\\\\"),
            '\n' => encoded.push_str("\\n"),
            '\r' => encoded.push_str("\\r"),
            '\t' if edge => encoded.push_str("\\t"),
            ' ' if edge => encoded.push_str("\\s"),
            c if edge && c.is_whitespace() => {
                encoded.push_str(&format!("\\u{{{:x}}}", u32::from(c)))
            }
            c => encoded.push(c),
        }
    }
    encoded
}

fn decode_name(encoded: &str) -> Result<String, String> {
    if encoded == "\\e" {
        return Ok(String::new());
    }

    let mut name = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            name.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => name.push('\\'),
            Some('n') => name.push('\n'),
            Some('r') => name.push('\r'),
            Some('t') => name.push('\t'),
            Some('s') => name.push(' '),
            Some('u') => {
                let digits: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let code = digits
                    .strip_prefix('{')
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid escape '\\u{}}}'", digits))?;
                name.push(code);
            }
            Some(other) => return Err(format!("unknown escape '\\{}'", other)),
            None => return Err("dangling '\\'".to_string()),
        }
    }
    Ok(name)
}

/// The duration is the last whitespace-separated token; everything before it is the name.
fn parse_record(line_no: usize, line: &str) -> Result<Preset, StoreError> {
    let malformed = |reason: &str| StoreError::Malformed {
        line: line_no,
        reason: reason.to_string(),
    };

    let (name, secs) = line
        .trim()
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| malformed("expected `name seconds`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(malformed("empty name"));
    }
    let name = decode_name(name).map_err(|reason| malformed(&reason))?;
    let secs = secs
        .parse::<u64>()
        .map_err(|e| malformed(&format!("invalid seconds '{}': {}", secs, e)))?;

    Ok(Preset::new(name, secs))
}

/// In-process store, mainly for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryPresetStore {
    presets: Mutex<Vec<Preset>>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-persisted library
    pub fn with_presets(presets: Vec<Preset>) -> Self {
        Self {
            presets: Mutex::new(presets),
        }
    }

    /// What the last save wrote
    pub fn snapshot(&self) -> Vec<Preset> {
        self.presets.lock().clone()
    }
}

impl PresetStore for MemoryPresetStore {
    fn load(&self) -> Result<Vec<Preset>, StoreError> {
        Ok(self.presets.lock().clone())
    }

    fn save(&self, presets: &[Preset]) -> Result<(), StoreError> {
        *self.presets.lock() = presets.to_vec();
        Ok(())
    }
}

impl<S: PresetStore + ?Sized> PresetStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Vec<Preset>, StoreError> {
        (**self).load()
    }

    fn save(&self, presets: &[Preset]) -> Result<(), StoreError> {
        (**self).save(presets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_creates_directory_and_names_with_spaces_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path().join("nested").join("data"));

        store.save(&Preset::defaults()).unwrap();
        assert!(store.path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, Preset::defaults());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path());
        fs::write(store.path(), "Tea 180\nnonsense\nEggs soft\n\n  Coffee   240  \n").unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![Preset::new("Tea", 180), Preset::new("Coffee", 240)]);
    }

    #[test]
    fn unreadable_library_is_an_error_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path());
        fs::write(store.path(), "nonsense\nEggs soft\n\n").unwrap();

        match store.load() {
            Err(StoreError::Malformed { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn blank_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path());
        fs::write(store.path(), "\n  \n").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn awkward_names_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path());
        let presets = vec![
            Preset::new("", 10),
            Preset::new("a\nb", 20),
            Preset::new(" padded ", 30),
            Preset::new("C:\\timers\\new", 40),
            Preset::new("\ttabbed\r", 50),
            Preset::new("Quick Timer", 60),
        ];

        store.save(&presets).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap().lines().count(), presets.len());
        assert_eq!(store.load().unwrap(), presets);
    }

    #[test]
    fn bad_escape_is_malformed() {
        assert!(matches!(parse_record(1, "a\\q 10"), Err(StoreError::Malformed { .. })));
        assert!(matches!(parse_record(1, "a\\u{zz} 10"), Err(StoreError::Malformed { .. })));
        assert_eq!(parse_record(1, "\\u{a0}x 10").unwrap(), Preset::new("\u{a0}x", 10));
    }

    #[test]
    fn parse_record_reports_line_number() {
        match parse_record(7, "Tea") {
            Err(StoreError::Malformed { line, .. }) => assert_eq!(line, 7),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn memory_store_keeps_last_save() {
        let store = MemoryPresetStore::new();
        assert!(store.load().unwrap().is_empty());

        store.save(&[Preset::new("Tea", 180)]).unwrap();
        assert_eq!(store.snapshot(), vec![Preset::new("Tea", 180)]);
    }
}
