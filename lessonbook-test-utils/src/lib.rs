//! Lessonbook Test Utilities
//!
//! Shared test infrastructure for the lessonbook workspace:
//! - Scripted live sources and a failing key/value store
//! - Proptest generators for identities and cache keys
//! - Resolver fixtures over a shared in-memory store
//! - Assertions on provenance and resolve errors

pub use lessonbook_core::{
    AuthContext, InternalIdentity, LessonSchedule, LiveSourceError, Mode, ResolveError,
    StudentRoster, TeacherProfile,
};
pub use lessonbook_storage::{
    CacheKey, DurableCache, InMemoryStore, KeyValueStore, LiveSource, Provenance, Resolved,
    Resolver, Resource, StoreError,
};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

// ============================================================================
// SCRIPTED LIVE SOURCE
// ============================================================================

/// One scripted answer from a live source.
#[derive(Debug, Clone)]
pub enum LiveOutcome<T> {
    Value(T),
    Empty,
    Fail(LiveSourceError),
}

impl<T: Clone> LiveOutcome<T> {
    fn to_result(&self) -> Result<Option<T>, LiveSourceError> {
        match self {
            Self::Value(value) => Ok(Some(value.clone())),
            Self::Empty => Ok(None),
            Self::Fail(e) => Err(e.clone()),
        }
    }
}

/// Live source that plays back scripted outcomes.
///
/// Queued outcomes are consumed in order; once the queue is empty every
/// call gets the standing outcome.
#[derive(Debug)]
pub struct ScriptedLiveSource<T> {
    queued: Mutex<VecDeque<LiveOutcome<T>>>,
    standing: LiveOutcome<T>,
    calls: AtomicUsize,
    identities: Mutex<Vec<InternalIdentity>>,
}

fn lock<U>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Clone> ScriptedLiveSource<T> {
    pub fn new(standing: LiveOutcome<T>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            standing,
            calls: AtomicUsize::new(0),
            identities: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(value: T) -> Self {
        Self::new(LiveOutcome::Value(value))
    }

    pub fn empty() -> Self {
        Self::new(LiveOutcome::Empty)
    }

    pub fn failing(error: LiveSourceError) -> Self {
        Self::new(LiveOutcome::Fail(error))
    }

    /// Always fails with `LiveSourceError::Unavailable`.
    pub fn unavailable() -> Self {
        Self::failing(LiveSourceError::unavailable("scripted outage"))
    }

    /// Queue `outcome` ahead of the standing one.
    pub fn then(self, outcome: LiveOutcome<T>) -> Self {
        lock(&self.queued).push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Identities passed to `fetch`, in call order.
    pub fn identities(&self) -> Vec<InternalIdentity> {
        lock(&self.identities).clone()
    }
}

#[async_trait]
impl<T: Resource> LiveSource<T> for ScriptedLiveSource<T> {
    async fn fetch(&self, identity: &InternalIdentity) -> Result<Option<T>, LiveSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.identities).push(*identity);
        let next = lock(&self.queued).pop_front();
        match next {
            Some(outcome) => outcome.to_result(),
            None => self.standing.to_result(),
        }
    }
}

// ============================================================================
// FAILING STORE
// ============================================================================

/// Key/value store that refuses every operation.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    attempts: AtomicUsize,
}

impl UnavailableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations attempted so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn refuse<U>(&self) -> Result<U, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }
}

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        self.refuse()
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        self.refuse()
    }

    fn remove(&self, _key: &str) -> Result<bool, StoreError> {
        self.refuse()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.refuse()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for lessonbook inputs.

    use super::*;
    use proptest::prelude::*;

    /// Provider-style external identities: never blank.
    pub fn arb_external_identity() -> impl Strategy<Value = String> {
        prop_oneof![
            "user_[A-Za-z0-9]{8,27}",
            "[a-z]{1,12}@[a-z]{1,10}\\.(com|org|io)",
            "auth0\\|[0-9a-f]{24}",
            "[ -~]{0,40}[!-~][ -~]{0,40}",
        ]
    }

    /// Whitespace-only identities. Non-empty, so they hash like any other.
    pub fn arb_whitespace_identity() -> impl Strategy<Value = String> {
        "[ \t\n\r]{1,8}"
    }

    /// Logical names as used for cache keys.
    pub fn arb_logical_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,31}"
    }

    pub fn arb_mode() -> impl Strategy<Value = Mode> {
        prop_oneof![Just(Mode::Augmented), Just(Mode::Strict)]
    }

    pub fn arb_live_error() -> impl Strategy<Value = LiveSourceError> {
        prop_oneof![
            "[a-z ]{1,20}".prop_map(|reason| LiveSourceError::unavailable(reason)),
            (500u16..600, "[a-z ]{0,20}")
                .prop_map(|(status, message)| LiveSourceError::Backend { status, message }),
            "[a-z ]{1,20}".prop_map(|reason| LiveSourceError::Decode { reason }),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built resolvers and inputs for common scenarios.

    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    pub const SESSION_IDENTITY: &str = "user_2aBcDeFgHiJkLmNoPqRs";

    pub fn signed_in() -> AuthContext {
        AuthContext::signed_in(SESSION_IDENTITY)
    }

    pub fn augmented_resolver() -> Resolver<InMemoryStore> {
        Resolver::with_defaults(Arc::new(InMemoryStore::new()), Mode::Augmented)
    }

    pub fn strict_resolver() -> Resolver<InMemoryStore> {
        Resolver::with_defaults(Arc::new(InMemoryStore::new()), Mode::Strict)
    }

    /// Augmented and strict resolvers over one store.
    pub fn shared_store_resolvers() -> (Resolver<InMemoryStore>, Resolver<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (
            Resolver::with_defaults(Arc::clone(&store), Mode::Augmented),
            Resolver::with_defaults(store, Mode::Strict),
        )
    }

    /// A non-empty roster distinct from the mock dataset.
    pub fn live_roster() -> StudentRoster {
        let mut roster = StudentRoster::mock_dataset();
        for student in &mut roster.0 {
            student.full_name = format!("{} (live)", student.full_name);
        }
        roster
    }

    /// Raw envelope text with an arbitrary timestamp and payload.
    pub fn raw_envelope(timestamp: serde_json::Value, payload: serde_json::Value) -> String {
        serde_json::json!({ "timestamp": timestamp, "payload": payload }).to_string()
    }

    /// Envelope text stamped `cached_at`.
    pub fn envelope_at(payload: serde_json::Value, cached_at: DateTime<Utc>) -> String {
        raw_envelope(serde_json::json!(cached_at.timestamp_millis()), payload)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for resolution outcomes.

    use super::*;
    use std::fmt::Debug;

    /// Assert a successful resolution tagged `expected`.
    #[track_caller]
    pub fn assert_source<T: Debug>(
        result: &Result<Resolved<T>, ResolveError>,
        expected: Provenance,
    ) {
        match result {
            Ok(resolved) => assert_eq!(
                resolved.source(),
                expected,
                "wrong provenance for {:?}",
                resolved.value()
            ),
            Err(e) => panic!("Expected {expected} resolution, got error: {e}"),
        }
    }

    /// Assert a strict-mode live-source failure for `logical_name`.
    #[track_caller]
    pub fn assert_live_source_error<T: Debug>(
        result: &Result<Resolved<T>, ResolveError>,
        logical_name: &str,
    ) {
        match result {
            Err(ResolveError::LiveSource {
                logical_name: name, ..
            }) => assert_eq!(name, logical_name),
            other => panic!("Expected LiveSource error for {logical_name}, got: {other:?}"),
        }
    }

    #[track_caller]
    pub fn assert_auth_error<T: Debug>(result: &Result<Resolved<T>, ResolveError>) {
        match result {
            Err(e) if e.is_auth() => {}
            other => panic!("Expected auth error, got: {other:?}"),
        }
    }
}

/// Install a test-writer tracing subscriber honoring `RUST_LOG`. Safe to
/// call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_scripted_queue_then_standing() {
        let live = ScriptedLiveSource::returning(fixtures::live_roster())
            .then(LiveOutcome::Empty)
            .then(LiveOutcome::Fail(LiveSourceError::unavailable("down")));
        let identity = lessonbook_core::DEV_IDENTITY;

        assert_eq!(live.fetch(&identity).await, Ok(None));
        assert!(live.fetch(&identity).await.is_err());
        assert_eq!(live.fetch(&identity).await, Ok(Some(fixtures::live_roster())));
        assert_eq!(live.calls(), 3);
        assert_eq!(live.identities(), vec![identity; 3]);
    }

    #[test]
    fn test_unavailable_store_refuses() {
        let store = UnavailableStore::new();
        assert!(store.get("k").is_err());
        assert!(store.set("k", "v").is_err());
        assert!(store.keys().is_err());
        assert_eq!(store.attempts(), 3);
    }

    #[test]
    fn test_live_roster_differs_from_mock() {
        let roster = fixtures::live_roster();
        assert!(!roster.is_empty());
        assert_ne!(roster, StudentRoster::mock_dataset());
    }

    #[test]
    fn test_raw_envelope_shape() {
        let raw = fixtures::raw_envelope(serde_json::json!(5), serde_json::json!([1]));
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(parsed["timestamp"], 5);
        assert_eq!(parsed["payload"], serde_json::json!([1]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_external_identities_are_not_blank(id in generators::arb_external_identity()) {
            prop_assert!(!id.trim().is_empty());
        }

        #[test]
        fn prop_whitespace_identities_are_non_empty(id in generators::arb_whitespace_identity()) {
            prop_assert!(!id.is_empty());
            prop_assert!(id.trim().is_empty());
        }

        #[test]
        fn prop_logical_names_make_keys(name in generators::arb_logical_name()) {
            prop_assert!(CacheKey::new(name).is_some());
        }
    }
}
