//! LMDB-backed key/value store.
//!
//! Uses the heed crate (Rust bindings for LMDB) as the local persistence
//! boundary when the cache runs outside a browser. Each operation runs in its
//! own LMDB transaction, so writes are whole-value replacements.

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};

use super::store::{KeyValueStore, StoreError};

/// Error type for opening an LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn txn_err(e: heed::Error) -> StoreError {
    StoreError::Transaction(e.to_string())
}

/// LMDB-backed string store.
///
/// # Example
///
/// ```ignore
/// use lessonbook_storage::cache::{DurableCache, LmdbStore};
///
/// let store = LmdbStore::open("/var/lib/lessonbook/cache", 64)?;
/// let cache = DurableCache::new(Arc::new(store), Mode::Augmented, CacheConfig::default())?;
/// ```
pub struct LmdbStore {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbStore {
    /// Open (or create) a store in `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per directory by this
        // process and never mapped with conflicting flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }
}

impl KeyValueStore for LmdbStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let value = self.db.get(&rtxn, key).map_err(txn_err)?;
        Ok(value.map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.put(&mut wtxn, key, value).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let deleted = self.db.delete(&mut wtxn, key).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let iter = self.db.iter(&rtxn).map_err(txn_err)?;

        let keys = iter
            .map(|entry| entry.map(|(key, _)| key.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(txn_err)?;
        Ok(keys)
    }
}
