//! Durable cache layer with explicit freshness and validation.
//!
//! Entries are stored as timestamped JSON envelopes under a namespaced key in
//! a [`KeyValueStore`]. Reads validate the envelope and its age before
//! trusting it; anything malformed or past the freshness window is a miss.
//!
//! # Mode gating
//!
//! The cache only reads and writes in augmented mode. In strict mode `put` is
//! a no-op, `get` returns the caller's default, and `clear_all` removes
//! nothing.
//!
//! # Example
//!
//! ```ignore
//! let cache = DurableCache::new(store, Mode::Augmented, CacheConfig::default())?;
//! let key = CacheKey::from_static("teacher_profile");
//!
//! cache.put(&key, &profile);
//! let profile: Option<TeacherProfile> = cache.get(&key, None);
//! ```

pub mod durable;
pub mod envelope;
pub mod key;
pub mod lmdb_backend;
pub mod store;

pub use durable::{CacheConfig, CacheStats, DurableCache};
pub use envelope::{CacheEnvelope, CacheRead, CorruptReason, EnvelopeRead};
pub use key::CacheKey;
pub use lmdb_backend::{LmdbStore, LmdbStoreError};
pub use store::{InMemoryStore, KeyValueStore, StoreError};
