//! Lessonbook Storage - durable cache and resolution pipeline
//!
//! The cache persists timestamped envelopes in a [`KeyValueStore`]; the
//! resolver layers live fetches, cache fallback and mock datasets on top,
//! gated by the injected [`Mode`](lessonbook_core::Mode).

pub mod cache;
pub mod resolve;

pub use cache::{
    CacheConfig, CacheEnvelope, CacheKey, CacheRead, CacheStats, CorruptReason, DurableCache,
    EnvelopeRead, InMemoryStore, KeyValueStore, LmdbStore, LmdbStoreError, StoreError,
};
pub use resolve::{FallbackReason, LiveFn, LiveSource, Provenance, Resolved, Resolver, Resource};
