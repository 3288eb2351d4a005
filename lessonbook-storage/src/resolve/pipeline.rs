//! Live, then cache, then mock resolution.
//!
//! A [`Resolver`] answers one question per call: what value should the
//! application show for this entity class right now, and where did it come
//! from. In strict mode only the live source counts and its failures surface.
//! In augmented mode failures and empty results fall through to the durable
//! cache and finally to the entity's mock dataset.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lessonbook_core::{
    to_internal_identity, ConfigError, IdentityContext, InternalIdentity, LessonbookResult, Mode,
    ResolveError, RuntimeConfig, DEV_IDENTITY,
};

use super::provenance::{FallbackReason, Provenance, Resolved};
use super::traits::{LiveSource, Resource};
use crate::cache::{CacheConfig, DurableCache, KeyValueStore};

/// Resolution pipeline over a durable cache.
///
/// # Example
///
/// ```ignore
/// let resolver = Resolver::from_env(Arc::new(InMemoryStore::new()))?;
///
/// let roster = resolver.resolve::<StudentRoster, _, _>(&students_api, &auth).await?;
/// if roster.source().is_fallback() {
///     show_offline_banner();
/// }
/// ```
pub struct Resolver<S: KeyValueStore> {
    cache: DurableCache<S>,
    dev_identity: InternalIdentity,
}

impl<S: KeyValueStore> Resolver<S> {
    pub fn new(cache: DurableCache<S>, dev_identity: InternalIdentity) -> Self {
        Self {
            cache,
            dev_identity,
        }
    }

    /// Build a resolver with the configured mode, cache settings and
    /// development identity. Fails if the cache settings do not validate.
    pub fn from_config(store: Arc<S>, config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let cache_config = CacheConfig::from(config.cache.clone());
        let cache = DurableCache::new(store, config.mode, cache_config)?;
        Ok(Self::new(cache, config.dev_identity))
    }

    /// Build a resolver from the process environment; see
    /// [`RuntimeConfig::load`].
    pub fn from_env(store: Arc<S>) -> LessonbookResult<Self> {
        let config = RuntimeConfig::load()?;
        Ok(Self::from_config(store, &config)?)
    }

    /// Build a resolver from variables supplied by `lookup`.
    pub fn from_lookup<F>(store: Arc<S>, lookup: F) -> LessonbookResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = RuntimeConfig::from_lookup(lookup)?;
        Ok(Self::from_config(store, &config)?)
    }

    /// Resolver using [`DEV_IDENTITY`] and default cache settings.
    pub fn with_defaults(store: Arc<S>, mode: Mode) -> Self {
        Self::new(DurableCache::with_defaults(store, mode), DEV_IDENTITY)
    }

    pub fn mode(&self) -> Mode {
        self.cache.mode()
    }

    pub fn cache(&self) -> &DurableCache<S> {
        &self.cache
    }

    /// Identity the live source is queried with.
    ///
    /// Augmented mode always acts as the development identity. Strict mode
    /// hashes the session's external identity and fails without one.
    pub fn effective_identity<A: IdentityContext>(
        &self,
        auth: &A,
    ) -> Result<InternalIdentity, ResolveError> {
        if !auth.is_ready() {
            return Err(ResolveError::AuthPending);
        }

        match self.mode() {
            Mode::Augmented => Ok(self.dev_identity),
            Mode::Strict => {
                let external = auth.session_identity().ok_or(ResolveError::AuthRequired)?;
                Ok(to_internal_identity(external)?)
            }
        }
    }

    /// Resolve `T` for the current session.
    pub async fn resolve<T, L, A>(&self, live: &L, auth: &A) -> Result<Resolved<T>, ResolveError>
    where
        T: Resource,
        L: LiveSource<T> + ?Sized,
        A: IdentityContext,
    {
        self.resolve_at(live, auth, Utc::now()).await
    }

    /// Same as [`resolve`](Self::resolve), with `now` used both to stamp
    /// write-throughs and to judge cache freshness.
    pub async fn resolve_at<T, L, A>(
        &self,
        live: &L,
        auth: &A,
        now: DateTime<Utc>,
    ) -> Result<Resolved<T>, ResolveError>
    where
        T: Resource,
        L: LiveSource<T> + ?Sized,
        A: IdentityContext,
    {
        let identity = self.effective_identity(auth)?;
        let key = T::cache_key();
        let mode = self.mode();

        let reason = match live.fetch(&identity).await {
            Ok(Some(value)) if !value.is_empty() => {
                self.cache.put_at(&key, &value, now);
                return Ok(Resolved::new(Some(value), Provenance::Live));
            }
            Ok(empty) => {
                if mode.is_strict() {
                    return Ok(Resolved::new(empty, Provenance::Live));
                }
                mode.log_augmented(format_args!("{} live result empty, falling back", key));
                FallbackReason::Empty
            }
            Err(e) => {
                tracing::warn!(key = %key, mode = %mode, error = %e, "live fetch failed");
                if mode.is_strict() {
                    return Err(ResolveError::LiveSource {
                        logical_name: T::logical_name().to_string(),
                        source: e,
                    });
                }
                FallbackReason::Error
            }
        };

        if let Some(read) = self
            .cache
            .lookup::<T>(&key, now)
            .filter(|read| !read.value().is_empty())
        {
            let source = Provenance::cached(reason);
            tracing::debug!(
                key = %key,
                source = %source,
                cached_at = %read.cached_at(),
                age_ms = read.staleness_at(now).as_millis() as u64,
                "served from cache"
            );
            return Ok(Resolved::new(Some(read.into_value()), source));
        }

        let source = Provenance::mock(reason);
        tracing::debug!(key = %key, source = %source, "served mock dataset");
        Ok(Resolved::new(Some(T::mock_dataset()), source))
    }

    /// Drop every cached entity under this resolver's namespace.
    pub fn clear_all_cached(&self) -> usize {
        self.cache.clear_all()
    }
}

impl<S: KeyValueStore> Clone for Resolver<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            dev_identity: self.dev_identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use lessonbook_core::{
        AuthContext, IdentityError, LessonbookError, LiveSourceError, StudentRoster,
        TeacherProfile, AUGMENTED_MODE_ENV, CONFIG_PATH_ENV,
    };
    use std::sync::Mutex;

    /// Answers every fetch with a clone of its configured result and records
    /// the identities it was asked for.
    struct FixedSource<T> {
        result: Result<Option<T>, LiveSourceError>,
        seen: Mutex<Vec<InternalIdentity>>,
    }

    impl<T> FixedSource<T> {
        fn new(result: Result<Option<T>, LiveSourceError>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl<T: Resource> LiveSource<T> for FixedSource<T> {
        async fn fetch(&self, identity: &InternalIdentity) -> Result<Option<T>, LiveSourceError> {
            self.seen.lock().expect("lock").push(*identity);
            self.result.clone()
        }
    }

    fn resolver(mode: Mode) -> Resolver<InMemoryStore> {
        Resolver::with_defaults(Arc::new(InMemoryStore::new()), mode)
    }

    fn roster_of(names: &[&str]) -> StudentRoster {
        let mut roster = StudentRoster::mock_dataset();
        roster.0.truncate(names.len());
        for (student, name) in roster.0.iter_mut().zip(names) {
            student.full_name = name.to_string();
        }
        roster
    }

    #[tokio::test]
    async fn test_pending_auth_touches_nothing() {
        let resolver = resolver(Mode::Augmented);
        let live = FixedSource::new(Ok(Some(roster_of(&["a"]))));

        let err = resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::loading())
            .await
            .expect_err("auth pending");
        assert!(matches!(err, ResolveError::AuthPending));
        assert_eq!(live.calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_requires_session() {
        let resolver = resolver(Mode::Strict);
        let live = FixedSource::new(Ok(Some(roster_of(&["a"]))));

        let err = resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::anonymous())
            .await
            .expect_err("auth required");
        assert!(matches!(err, ResolveError::AuthRequired));
        assert!(err.is_auth());
        assert_eq!(live.calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_empty_session_is_identity_error() {
        let resolver = resolver(Mode::Strict);
        let live = FixedSource::<StudentRoster>::new(Ok(None));

        let err = resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::signed_in(""))
            .await
            .expect_err("empty identity");
        assert!(matches!(err, ResolveError::Identity(IdentityError::EmptyInput)));
        assert_eq!(live.calls(), 0);
    }

    #[tokio::test]
    async fn test_strict_whitespace_session_is_hashed() {
        let resolver = resolver(Mode::Strict);
        let live = FixedSource::new(Ok(Some(roster_of(&["a"]))));

        resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::signed_in("   "))
            .await
            .expect("whitespace identity maps");
        let expected = to_internal_identity("   ").expect("non-empty");
        assert_eq!(*live.seen.lock().expect("lock"), vec![expected]);
    }

    #[tokio::test]
    async fn test_identity_per_mode() {
        let session = AuthContext::signed_in("user_2xYz");

        let strict = resolver(Mode::Strict);
        let live = FixedSource::new(Ok(Some(roster_of(&["a"]))));
        strict
            .resolve::<StudentRoster, _, _>(&live, &session)
            .await
            .expect("resolve");

        let augmented = resolver(Mode::Augmented);
        let dev_live = FixedSource::new(Ok(Some(roster_of(&["a"]))));
        augmented
            .resolve::<StudentRoster, _, _>(&dev_live, &session)
            .await
            .expect("resolve");

        let expected = to_internal_identity("user_2xYz").expect("non-empty");
        assert_eq!(*live.seen.lock().expect("lock"), vec![expected]);
        assert_eq!(*dev_live.seen.lock().expect("lock"), vec![DEV_IDENTITY]);
    }

    #[tokio::test]
    async fn test_live_value_written_through() {
        let resolver = resolver(Mode::Augmented);
        let roster = roster_of(&["Ada", "Ben"]);
        let live = FixedSource::new(Ok(Some(roster.clone())));

        let resolved = resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::anonymous())
            .await
            .expect("resolve");
        assert_eq!(resolved.source(), Provenance::Live);
        assert_eq!(resolved.value(), Some(&roster));

        let cached: StudentRoster = resolver
            .cache()
            .get(&StudentRoster::cache_key(), StudentRoster::default());
        assert_eq!(cached, roster);
    }

    #[tokio::test]
    async fn test_live_error_uses_fresh_cache() {
        let resolver = resolver(Mode::Augmented);
        let now = Utc::now();
        let roster = roster_of(&["Ada"]);
        resolver
            .cache()
            .put_at(&StudentRoster::cache_key(), &roster, now - Duration::hours(1));

        let live = FixedSource::new(Err(LiveSourceError::unavailable("offline")));
        let resolved = resolver
            .resolve_at::<StudentRoster, _, _>(&live, &AuthContext::anonymous(), now)
            .await
            .expect("fallback");
        assert_eq!(resolved.source(), Provenance::CachedFallback);
        assert_eq!(resolved.into_value(), Some(roster));
    }

    #[tokio::test]
    async fn test_live_error_skips_stale_cache() {
        let resolver = resolver(Mode::Augmented);
        let now = Utc::now();
        resolver.cache().put_at(
            &StudentRoster::cache_key(),
            &roster_of(&["Ada"]),
            now - Duration::days(2),
        );

        let live = FixedSource::new(Err(LiveSourceError::unavailable("offline")));
        let resolved = resolver
            .resolve_at::<StudentRoster, _, _>(&live, &AuthContext::anonymous(), now)
            .await
            .expect("fallback");
        assert_eq!(resolved.source(), Provenance::MockFallback);
        assert_eq!(resolved.into_value(), Some(StudentRoster::mock_dataset()));
    }

    #[tokio::test]
    async fn test_empty_live_is_not_a_fallback() {
        let resolver = resolver(Mode::Augmented);
        let live = FixedSource::new(Ok(Some(StudentRoster::default())));

        let resolved = resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::anonymous())
            .await
            .expect("resolve");
        assert_eq!(resolved.source(), Provenance::Mock);
        assert!(!resolved.source().is_fallback());

        // Empty results are never written through.
        assert!(resolver.cache().store().is_empty());
    }

    #[tokio::test]
    async fn test_cached_empty_value_is_skipped() {
        let resolver = resolver(Mode::Augmented);
        resolver
            .cache()
            .put(&StudentRoster::cache_key(), &StudentRoster::default());

        let live = FixedSource::<StudentRoster>::new(Ok(None));
        let resolved = resolver
            .resolve::<StudentRoster, _, _>(&live, &AuthContext::anonymous())
            .await
            .expect("resolve");
        assert_eq!(resolved.source(), Provenance::Mock);
    }

    #[tokio::test]
    async fn test_strict_empty_returned_as_live() {
        let resolver = resolver(Mode::Strict);
        let session = AuthContext::signed_in("user_2xYz");

        let none = FixedSource::<TeacherProfile>::new(Ok(None));
        let resolved = resolver
            .resolve::<TeacherProfile, _, _>(&none, &session)
            .await
            .expect("resolve");
        assert_eq!(resolved.source(), Provenance::Live);
        assert_eq!(resolved.value(), None);

        let empty = FixedSource::new(Ok(Some(StudentRoster::default())));
        let resolved = resolver
            .resolve::<StudentRoster, _, _>(&empty, &session)
            .await
            .expect("resolve");
        assert_eq!(resolved.source(), Provenance::Live);
        assert_eq!(resolved.into_value(), Some(StudentRoster::default()));
    }

    #[tokio::test]
    async fn test_strict_surfaces_live_error() {
        let resolver = resolver(Mode::Strict);
        let live = FixedSource::<TeacherProfile>::new(Err(LiveSourceError::Backend {
            status: 503,
            message: "maintenance".to_string(),
        }));

        let err = resolver
            .resolve::<TeacherProfile, _, _>(&live, &AuthContext::signed_in("user_2xYz"))
            .await
            .expect_err("strict surfaces");
        match err {
            ResolveError::LiveSource {
                logical_name,
                source,
            } => {
                assert_eq!(logical_name, "teacher_profile");
                assert!(matches!(source, LiveSourceError::Backend { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_identity() {
        let dev = to_internal_identity("local-dev").expect("non-empty");
        let config = RuntimeConfig {
            dev_identity: dev,
            ..RuntimeConfig::default()
        }
        .with_mode(Mode::Augmented);
        let resolver = Resolver::from_config(Arc::new(InMemoryStore::new()), &config)
            .expect("valid config");

        assert_eq!(
            resolver.effective_identity(&AuthContext::anonymous()).expect("identity"),
            dev
        );
    }

    #[test]
    fn test_from_config_rejects_unsafe_namespace() {
        let mut config = RuntimeConfig::default().with_mode(Mode::Augmented);
        config.cache.namespace = String::new();

        let result = Resolver::from_config(Arc::new(InMemoryStore::new()), &config);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_lookup_reads_mode() {
        let resolver = Resolver::from_lookup(Arc::new(InMemoryStore::new()), |name| {
            (name == AUGMENTED_MODE_ENV).then(|| "true".to_string())
        })
        .expect("valid environment");
        assert_eq!(resolver.mode(), Mode::Augmented);
        assert_eq!(resolver.cache().config(), &CacheConfig::default());

        let resolver =
            Resolver::from_lookup(Arc::new(InMemoryStore::new()), |_| None).expect("defaults");
        assert_eq!(resolver.mode(), Mode::Strict);
    }

    #[test]
    fn test_from_lookup_surfaces_config_errors() {
        let result = Resolver::from_lookup(Arc::new(InMemoryStore::new()), |name| {
            (name == AUGMENTED_MODE_ENV).then(|| "sometimes".to_string())
        });
        assert!(matches!(result, Err(LessonbookError::Config(_))));

        let result = Resolver::from_lookup(Arc::new(InMemoryStore::new()), |name| {
            (name == CONFIG_PATH_ENV).then(|| "/nonexistent/lessonbook.toml".to_string())
        });
        assert!(matches!(result, Err(LessonbookError::Config(ConfigError::Io(_)))));
    }

    #[test]
    fn test_clear_all_cached() {
        let resolver = resolver(Mode::Augmented);
        resolver
            .cache()
            .put(&StudentRoster::cache_key(), &roster_of(&["Ada"]));
        resolver
            .cache()
            .put(&TeacherProfile::cache_key(), &TeacherProfile::mock_dataset());

        let clone = resolver.clone();
        assert_eq!(clone.clear_all_cached(), 2);
        assert!(resolver.cache().store().is_empty());
    }
}
