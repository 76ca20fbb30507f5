//! Synchronous observer lists
//!
//! Callbacks are keyed by UUID so they can be removed again, and are invoked
//! in subscription order on the emitting thread. A panicking callback is
//! logged and skipped; it never takes down the emitter.

use log::error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// List of callbacks for events of type `T`
pub struct Subscribers<T> {
    callbacks: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Callback<T>)>> {
        // The list is plain data, a panicking subscriber cannot leave it torn
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every callback with `event`, returning how many were called.
    ///
    /// The list is snapshotted first so callbacks may subscribe, unsubscribe
    /// or emit again without deadlocking.
    pub fn emit(&self, event: &T) -> usize {
        let snapshot: Vec<(SubscriptionId, Callback<T>)> = self
            .lock()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();
        for (id, callback) in &snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                error!("Subscriber {} panicked: {}", id, panic_message(payload.as_ref()));
            }
        }
        snapshot.len()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}
