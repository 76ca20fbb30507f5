//! Configuration management

mod settings;
mod storage;

pub use settings::{SettingsState, SettingsStore};
pub use storage::{JsonFileStorage, MemoryStorage, SettingsStorage, StorageError, SETTINGS_FILE_NAME};
