//! Key/value store abstraction under the durable cache.
//!
//! This trait abstracts over the local persistence boundary (an in-memory
//! map, LMDB on disk, or a browser-origin store behind FFI). Operations are
//! synchronous and whole-value: a reader sees either the previous value or
//! the new one, never a partial write.

use std::collections::HashMap;
use std::sync::RwLock;

/// Error type for key/value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store disabled, full, or otherwise refusing operations.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend transaction failed.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

/// Synchronous string key/value store.
///
/// Implementations must be thread-safe. `set` replaces any previous value in
/// full.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, across all namespaces.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(entries.keys().cloned().collect())
    }
}
