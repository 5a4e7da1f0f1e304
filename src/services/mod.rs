//! External collaborators of the registry
//!
//! Preset persistence and completion notification live behind small traits
//! so the registry can be embedded with any storage or notification backend.

pub mod completion;
pub mod preset_store;

// Re-export main types
pub use completion::{ChannelSink, Completion, CompletionSink};
pub use preset_store::{FilePresetStore, MemoryPresetStore, PresetStore};
