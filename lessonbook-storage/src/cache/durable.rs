//! Durable, mode-gated cache over a [`KeyValueStore`].
//!
//! The cache is an optimization, never a correctness requirement: every
//! storage or serialization failure is logged and turned into a miss or a
//! no-op. In strict mode the cache neither writes nor serves anything, so it
//! can never mask a backend outage.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lessonbook_core::{CacheSettings, ConfigError, Mode};
use serde::{de::DeserializeOwned, Serialize};

use super::envelope::{CacheEnvelope, CacheRead, EnvelopeRead};
use super::key::CacheKey;
use super::store::KeyValueStore;

/// Configuration for the durable cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Prefix prepended to every logical name.
    pub namespace: String,
    /// Entries this old or older are stale.
    pub freshness_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheSettings::default().into()
    }
}

impl From<CacheSettings> for CacheConfig {
    fn from(settings: CacheSettings) -> Self {
        Self {
            namespace: settings.namespace,
            freshness_window: settings.freshness_window,
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            freshness_window: config.freshness_window,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Same rules as [`CacheSettings::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        CacheSettings::from(self).validate()
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fresh, valid reads.
    pub hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
    /// Reads that found an envelope past the freshness window.
    pub stale: u64,
    /// Reads that found a malformed envelope.
    pub corrupt: u64,
    /// Successful writes.
    pub writes: u64,
    /// Storage or serialization failures, reads and writes alike.
    pub failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0) over all reads.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale + self.corrupt;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Key-namespaced, timestamped, TTL-bounded cache.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let cache = DurableCache::new(store, Mode::Augmented, CacheConfig::default())?;
/// let key = CacheKey::from_static("students");
///
/// cache.put(&key, &roster);
/// let roster: StudentRoster = cache.get(&key, StudentRoster::default());
/// ```
pub struct DurableCache<S: KeyValueStore> {
    store: Arc<S>,
    mode: Mode,
    config: CacheConfig,
    stats: Arc<RwLock<CacheStats>>,
}

impl<S: KeyValueStore> DurableCache<S> {
    /// Fails with [`ConfigError::InvalidValue`] when `config` does not
    /// validate; a blank or undelimited namespace would let
    /// [`clear_all`](Self::clear_all) remove keys it does not own.
    pub fn new(store: Arc<S>, mode: Mode, config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::unchecked(store, mode, config))
    }

    /// Create a cache with the default namespace and a one-day window.
    pub fn with_defaults(store: Arc<S>, mode: Mode) -> Self {
        Self::unchecked(store, mode, CacheConfig::default())
    }

    fn unchecked(store: Arc<S>, mode: Mode, config: CacheConfig) -> Self {
        Self {
            store,
            mode,
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, f: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.write() {
            f(&mut stats);
        }
    }

    /// Store `payload` under `key`, stamped with the current time.
    pub fn put<T: Serialize>(&self, key: &CacheKey, payload: &T) {
        self.put_at(key, payload, Utc::now());
    }

    /// Store `payload` under `key`, stamped with `cached_at`.
    ///
    /// No-op in strict mode. Failures are logged, never returned.
    pub fn put_at<T: Serialize>(&self, key: &CacheKey, payload: &T, cached_at: DateTime<Utc>) {
        if self.mode.is_strict() {
            return;
        }

        let storage_key = key.storage_key(&self.config.namespace);
        let encoded = match CacheEnvelope::new(payload, cached_at).encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize cache entry");
                self.record(|s| s.failures += 1);
                return;
            }
        };

        match self.store.set(&storage_key, &encoded) {
            Ok(()) => {
                tracing::debug!(key = %key, bytes = encoded.len(), "cache entry written");
                self.record(|s| s.writes += 1);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to write cache entry");
                self.record(|s| s.failures += 1);
            }
        }
    }

    /// Read the payload under `key`, or `default` on miss, staleness,
    /// corruption, storage failure, or strict mode.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey, default: T) -> T {
        self.get_as_of(key, default, Utc::now())
    }

    /// Same as [`get`](Self::get), evaluating freshness at `now`.
    pub fn get_as_of<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        default: T,
        now: DateTime<Utc>,
    ) -> T {
        self.lookup(key, now)
            .map(CacheRead::into_value)
            .unwrap_or(default)
    }

    /// Fresh, valid hit for `key` at `now`, if any.
    pub fn lookup<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Option<CacheRead<T>> {
        if self.mode.is_strict() {
            return None;
        }

        let storage_key = key.storage_key(&self.config.namespace);
        let raw = match self.store.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record(|s| s.misses += 1);
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read cache entry");
                self.record(|s| s.failures += 1);
                return None;
            }
        };

        match EnvelopeRead::<T>::parse(&raw) {
            EnvelopeRead::Valid(envelope) => {
                if envelope.is_fresh_at(now, self.config.freshness_window) {
                    self.record(|s| s.hits += 1);
                    Some(envelope.into())
                } else {
                    tracing::debug!(
                        key = %key,
                        age_ms = envelope.age_at(now).as_millis() as u64,
                        "cache entry stale"
                    );
                    self.record(|s| s.stale += 1);
                    None
                }
            }
            EnvelopeRead::Corrupt(reason) => {
                tracing::debug!(key = %key, reason = %reason, "discarding malformed cache entry");
                self.record(|s| s.corrupt += 1);
                None
            }
        }
    }

    /// Remove every entry under the namespace. Returns how many were removed.
    ///
    /// No-op returning 0 in strict mode.
    pub fn clear_all(&self) -> usize {
        if self.mode.is_strict() {
            return 0;
        }

        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "failed to enumerate cache keys");
                self.record(|s| s.failures += 1);
                return 0;
            }
        };

        let namespace = self.config.namespace.as_str();
        let mut removed = 0;
        for storage_key in keys
            .iter()
            .filter(|k| CacheKey::from_storage_key(namespace, k).is_some())
        {
            match self.store.remove(storage_key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(key = %storage_key, error = %e, "failed to remove cache entry");
                    self.record(|s| s.failures += 1);
                }
            }
        }

        tracing::info!(removed, namespace, "cache cleared");
        removed
    }
}

impl<S: KeyValueStore> Clone for DurableCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mode: self.mode,
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}
