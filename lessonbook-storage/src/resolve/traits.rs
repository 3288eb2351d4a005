//! Resource and live-source traits.
//!
//! This module defines the traits that resolvable entities and live data
//! sources implement.

use std::future::Future;

use async_trait::async_trait;
use lessonbook_core::{
    InternalIdentity, LessonSchedule, LiveSourceError, StudentRoster, TeacherProfile,
};
use serde::{de::DeserializeOwned, Serialize};

use super::mock;
use crate::cache::CacheKey;

/// Marker trait for types served through the resolution pipeline.
///
/// # Implementation Requirements
///
/// - `logical_name()` must return the same non-blank value for all instances;
///   it doubles as the cache key
/// - `mock_dataset()` must be deterministic: same value on every call
/// - `is_empty()` reports whether a live result carries no data (an empty
///   roster, for example)
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Logical name of this entity class. Must not be blank.
    fn logical_name() -> &'static str;

    /// Deterministic stand-in returned when no live or cached value exists.
    fn mock_dataset() -> Self;

    /// Whether this value carries no data.
    fn is_empty(&self) -> bool {
        false
    }

    /// Cache key for this entity class.
    ///
    /// # Panics
    ///
    /// Panics if [`logical_name`](Self::logical_name) is blank.
    fn cache_key() -> CacheKey {
        CacheKey::from_static(Self::logical_name())
    }
}

/// Live backend fetch for one entity class.
///
/// `Ok(None)` means the backend had nothing for this identity. Errors signal
/// unavailability; retries and timeouts are the implementation's concern.
#[async_trait]
pub trait LiveSource<T: Resource>: Send + Sync {
    async fn fetch(&self, identity: &InternalIdentity) -> Result<Option<T>, LiveSourceError>;
}

/// Adapts an async closure into a [`LiveSource`].
///
/// ```ignore
/// let live = LiveFn(|identity| async move { backend.students_for(identity).await });
/// ```
pub struct LiveFn<F>(pub F);

#[async_trait]
impl<T, F, Fut> LiveSource<T> for LiveFn<F>
where
    T: Resource,
    F: Fn(InternalIdentity) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>, LiveSourceError>> + Send + 'static,
{
    async fn fetch(&self, identity: &InternalIdentity) -> Result<Option<T>, LiveSourceError> {
        (self.0)(*identity).await
    }
}

// ============================================================================
// IMPLEMENTATIONS FOR LESSONBOOK ENTITIES
// ============================================================================

impl Resource for TeacherProfile {
    fn logical_name() -> &'static str {
        "teacher_profile"
    }

    fn mock_dataset() -> Self {
        mock::teacher_profile()
    }
}

impl Resource for StudentRoster {
    fn logical_name() -> &'static str {
        "students"
    }

    fn mock_dataset() -> Self {
        mock::student_roster()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Resource for LessonSchedule {
    fn logical_name() -> &'static str {
        "lessons"
    }

    fn mock_dataset() -> Self {
        mock::lesson_schedule()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
