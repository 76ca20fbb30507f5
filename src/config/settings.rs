//! Application settings store

use super::storage::{JsonFileStorage, SettingsStorage, StorageError};
use crate::core::{SubscriptionId, Subscribers};
use anyhow::Result;
use log::{debug, error, info, warn};
use netmon_types::{AppSettings, SpeedUnit};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lifecycle of the in-memory settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsState {
    /// Built-in defaults, nothing loaded
    Defaults,
    /// Loaded from storage
    Loaded,
    /// Changed in memory since the last load or save
    Dirty,
    /// Written to storage
    Persisted,
}

struct Inner {
    settings: AppSettings,
    state: SettingsState,
    /// Bumped on every mutation so a save can tell if it wrote the latest values
    generation: u64,
}

/// Holds the current settings and persists them
///
/// Construct one at startup and share it as `Arc<SettingsStore>`. All reads
/// and mutations go through one mutex, so [`SettingsStore::save`] always
/// writes a consistent snapshot. Saves are serialized by a second mutex held
/// from snapshot to state update, so the last save to finish wrote the
/// newest snapshot.
pub struct SettingsStore {
    inner: Mutex<Inner>,
    save_lock: Mutex<()>,
    storage: Box<dyn SettingsStorage>,
    subscribers: Subscribers<()>,
}

impl SettingsStore {
    /// Create a store with built-in defaults. Storage is not read until [`load`](Self::load).
    pub fn new(storage: impl SettingsStorage + 'static) -> Self {
        debug!("Settings location: {}", storage.location());
        Self {
            inner: Mutex::new(Inner {
                settings: AppSettings::default(),
                state: SettingsState::Defaults,
                generation: 0,
            }),
            save_lock: Mutex::new(()),
            storage: Box::new(storage),
            subscribers: Subscribers::new(),
        }
    }

    /// Create a store backed by the platform config directory
    pub fn with_default_location() -> Result<Self, StorageError> {
        Ok(Self::new(JsonFileStorage::default_location()?))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load settings from storage.
    ///
    /// A missing or unreadable blob leaves the built-in defaults in place.
    /// Never fails and never notifies subscribers.
    pub fn load(&self) {
        let (settings, state) = match self.try_load() {
            Ok(Some(settings)) => {
                info!("Loaded settings from {}", self.storage.location());
                (settings, SettingsState::Loaded)
            }
            Ok(None) => {
                debug!("No settings at {}, using defaults", self.storage.location());
                (AppSettings::default(), SettingsState::Defaults)
            }
            Err(e) => {
                warn!("Failed to load settings, using built-in defaults: {}", e);
                (AppSettings::default(), SettingsState::Defaults)
            }
        };

        let mut inner = self.lock();
        inner.settings = settings;
        inner.state = state;
        inner.generation += 1;
    }

    /// Try to load settings from storage
    fn try_load(&self) -> Result<Option<AppSettings>> {
        let bytes = match self.storage.read()? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let mut settings: AppSettings = serde_json::from_slice(&bytes)?;
        settings.sanitize();
        Ok(Some(settings))
    }

    /// Write the current settings to storage and notify subscribers.
    ///
    /// On failure the in-memory settings are kept, nobody is notified and
    /// the error is logged and returned.
    pub fn save(&self) -> Result<(), StorageError> {
        {
            let _saving = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);

            let (bytes, generation) = {
                let inner = self.lock();
                (serde_json::to_vec_pretty(&inner.settings), inner.generation)
            };

            // Mutations may continue while the blob is written
            let result = bytes
                .map_err(StorageError::from)
                .and_then(|bytes| self.storage.write(&bytes));

            if let Err(e) = result {
                error!("Failed to save settings to {}: {}", self.storage.location(), e);
                return Err(e);
            }

            let mut inner = self.lock();
            if inner.generation == generation {
                inner.state = SettingsState::Persisted;
            }
        }
        info!("Saved settings to {}", self.storage.location());

        let notified = self.subscribers.emit(&());
        debug!("Notified {} settings subscriber(s)", notified);
        Ok(())
    }

    /// Replace every setting at once. Call [`save`](Self::save) to commit and notify.
    pub fn replace_all(&self, settings: AppSettings) {
        self.update(|current| *current = settings);
    }

    /// Replace every setting with the built-in defaults (not yet saved)
    pub fn reset_to_defaults(&self) {
        self.replace_all(AppSettings::default());
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> AppSettings {
        self.lock().settings.clone()
    }

    /// Mutate settings in place. Changes stay in memory until saved.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AppSettings) -> R,
    {
        let mut inner = self.lock();
        let result = f(&mut inner.settings);
        inner.state = SettingsState::Dirty;
        inner.generation += 1;
        result
    }

    pub fn state(&self) -> SettingsState {
        self.lock().state
    }

    pub fn refresh_rate_ms(&self) -> i32 {
        self.lock().settings.refresh_rate_ms
    }

    pub fn speed_unit(&self) -> SpeedUnit {
        self.lock().settings.speed_unit
    }

    /// Register a callback invoked after every successful save
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribers.subscribe(move |_| callback())
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Where the settings are stored, for display
    pub fn location(&self) -> String {
        self.storage.location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStorage;
    use crossbeam::channel::{self, Receiver, Sender};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_subscriber(store: &SettingsStore) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        store.subscribe(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_new_store_has_defaults() {
        let store = SettingsStore::new(MemoryStorage::new());
        assert_eq!(store.settings(), AppSettings::default());
        assert_eq!(store.state(), SettingsState::Defaults);
    }

    #[test]
    fn test_load_missing_blob_uses_defaults() {
        let store = SettingsStore::new(MemoryStorage::new());
        store.update(|s| s.refresh_rate_ms = 250);
        store.load();
        assert_eq!(store.settings(), AppSettings::default());
        assert_eq!(store.state(), SettingsState::Defaults);
    }

    #[test]
    fn test_load_corrupt_blob_uses_defaults() {
        let store = SettingsStore::new(MemoryStorage::with_contents("{ not json"));
        let count = counting_subscriber(&store);
        store.load();
        assert_eq!(store.settings(), AppSettings::default());
        assert_eq!(store.state(), SettingsState::Defaults);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_wrong_types_is_not_partially_applied() {
        let store = SettingsStore::new(MemoryStorage::with_contents(
            r#"{"refresh_rate_ms": 250, "opacity": "very"}"#,
        ));
        store.load();
        assert_eq!(store.refresh_rate_ms(), 1000);
    }

    #[test]
    fn test_load_valid_blob() {
        let store = SettingsStore::new(MemoryStorage::with_contents(
            r#"{"refresh_rate_ms": 500, "speed_unit": "MBPerSec"}"#,
        ));
        let count = counting_subscriber(&store);
        store.load();
        assert_eq!(store.refresh_rate_ms(), 500);
        assert_eq!(store.speed_unit(), SpeedUnit::MBPerSec);
        assert_eq!(store.state(), SettingsState::Loaded);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_sanitizes_interval() {
        let store = SettingsStore::new(MemoryStorage::with_contents(r#"{"refresh_rate_ms": -3}"#));
        store.load();
        assert_eq!(store.refresh_rate_ms(), 1000);
    }

    #[test]
    fn test_save_notifies_each_subscriber_once() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SettingsStore::new(storage.clone());
        let first = counting_subscriber(&store);
        let second = counting_subscriber(&store);

        store.update(|s| s.speed_unit = SpeedUnit::Gbps);
        assert_eq!(store.state(), SettingsState::Dirty);
        store.save().unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(store.state(), SettingsState::Persisted);

        let saved: AppSettings = serde_json::from_slice(&storage.contents().unwrap()).unwrap();
        assert_eq!(saved.speed_unit, SpeedUnit::Gbps);
    }

    #[test]
    fn test_failed_save_does_not_notify() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let store = SettingsStore::new(storage.clone());
        let count = counting_subscriber(&store);

        store.update(|s| s.refresh_rate_ms = 2000);
        assert!(store.save().is_err());

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(store.refresh_rate_ms(), 2000);
        assert_eq!(store.state(), SettingsState::Dirty);
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_unsubscribed_callback_not_notified() {
        let store = SettingsStore::new(MemoryStorage::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let id = store.subscribe(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.unsubscribe(id));

        store.save().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reset_to_defaults_then_save() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SettingsStore::new(storage.clone());
        store.update(|s| {
            s.refresh_rate_ms = 3000;
            s.apply_preset("Sunset");
        });
        store.save().unwrap();

        store.reset_to_defaults();
        assert_eq!(store.state(), SettingsState::Dirty);
        store.save().unwrap();

        let reloaded = SettingsStore::new(storage.clone());
        reloaded.load();
        assert_eq!(reloaded.settings(), AppSettings::default());
        assert_eq!(reloaded.state(), SettingsState::Loaded);
    }

    #[test]
    fn test_subscriber_can_read_store_during_notify() {
        let store = Arc::new(SettingsStore::new(MemoryStorage::new()));
        let seen = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&store);
        let seen_clone = seen.clone();
        store.subscribe(move || {
            if let Some(store) = weak.upgrade() {
                seen_clone.store(store.refresh_rate_ms() as usize, Ordering::SeqCst);
            }
        });

        store.update(|s| s.refresh_rate_ms = 750);
        store.save().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 750);
    }

    /// Storage whose first write waits until the test releases it
    struct GatedStorage {
        inner: MemoryStorage,
        gated: AtomicBool,
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl SettingsStorage for GatedStorage {
        fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
            self.inner.read()
        }

        fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
            if self.gated.swap(false, Ordering::SeqCst) {
                let _ = self.entered.send(());
                let _ = self.release.recv();
            }
            self.inner.write(bytes)
        }

        fn location(&self) -> String {
            "gated".to_string()
        }
    }

    #[test]
    fn test_overlapping_saves_persist_newest_settings() {
        let (entered_tx, entered_rx) = channel::unbounded();
        let (release_tx, release_rx) = channel::unbounded();
        let storage = Arc::new(GatedStorage {
            inner: MemoryStorage::new(),
            gated: AtomicBool::new(true),
            entered: entered_tx,
            release: release_rx,
        });
        let store = Arc::new(SettingsStore::new(storage.clone()));

        store.update(|s| s.refresh_rate_ms = 111);
        let first = {
            let store = store.clone();
            std::thread::spawn(move || store.save())
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The first save is stuck mid-write with the old snapshot
        store.update(|s| s.refresh_rate_ms = 222);
        let second = {
            let store = store.clone();
            std::thread::spawn(move || store.save())
        };
        std::thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        first.join().unwrap().unwrap();
        second.join().unwrap().unwrap();

        let saved: AppSettings =
            serde_json::from_slice(&storage.inner.contents().unwrap()).unwrap();
        assert_eq!(saved.refresh_rate_ms, 222);
        assert_eq!(store.refresh_rate_ms(), 222);
        assert_eq!(store.state(), SettingsState::Persisted);
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("netmon-store-{}", uuid::Uuid::new_v4()))
            .join("settings.json");

        let store = SettingsStore::new(JsonFileStorage::new(&path));
        store.update(|s| {
            s.speed_unit = SpeedUnit::KBPerSec;
            s.always_on_top = false;
        });
        store.save().unwrap();

        let reloaded = SettingsStore::new(JsonFileStorage::new(&path));
        reloaded.load();
        assert_eq!(reloaded.speed_unit(), SpeedUnit::KBPerSec);
        assert!(!reloaded.settings().always_on_top);

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }
}
