//! Durable storage for the settings blob
//!
//! The store only needs "read bytes, or nothing yet" and "write bytes";
//! what the bytes mean is up to the caller.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Errors from reading or writing the settings blob
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Opaque durable blob with load/save
pub trait SettingsStorage: Send + Sync {
    /// Read the stored blob, or None if nothing has been written yet
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the stored blob
    fn write(&self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Human-readable location, for log messages
    fn location(&self) -> String;
}

/// Settings stored as a file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the platform config directory.
    ///
    /// Only resolves the path; nothing is read or created until used.
    pub fn default_location() -> Result<Self, StorageError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Get the default settings file path
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dirs = directories::ProjectDirs::from("com", "github.netmon", "netmon")
            .ok_or(StorageError::NoConfigDir)?;

        Ok(dirs.config_dir().join(SETTINGS_FILE_NAME))
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        std::fs::write(&self.path, bytes).map_err(|e| self.io_error(e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process storage, for embedding without a filesystem and for tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<Option<Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `bytes`
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Mutex::new(Some(bytes.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail (simulates a read-only location)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the stored blob
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SettingsStorage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.contents())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

impl<S: SettingsStorage + ?Sized> SettingsStorage for std::sync::Arc<S> {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).write(bytes)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("netmon-test-{}", uuid::Uuid::new_v4()))
            .join("nested")
            .join(SETTINGS_FILE_NAME)
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let storage = JsonFileStorage::new(temp_path());
        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let path = temp_path();
        let storage = JsonFileStorage::new(&path);
        storage.write(b"{}").unwrap();
        assert_eq!(storage.read().unwrap(), Some(b"{}".to_vec()));

        if let Some(root) = path.parent().and_then(|p| p.parent()) {
            std::fs::remove_dir_all(root).ok();
        }
    }

    #[test]
    fn test_memory_storage_write_failure() {
        let storage = MemoryStorage::with_contents("old");
        storage.set_fail_writes(true);
        assert!(matches!(
            storage.write(b"new"),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(storage.contents(), Some(b"old".to_vec()));
    }
}
