//! Lessonbook Core - identity, mode and shared types
//!
//! Pure types and policy with no storage behavior. The storage crate builds
//! the durable cache and resolution pipeline on top of these.

pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod identity;
pub mod mode;
pub mod telemetry;

pub use auth::{AuthContext, IdentityContext};
pub use config::{
    CacheSettings, RuntimeConfig, AUGMENTED_MODE_ENV, CONFIG_PATH_ENV, DEFAULT_CACHE_NAMESPACE,
    DEFAULT_FRESHNESS_WINDOW,
};
pub use entities::{Lesson, LessonSchedule, LessonStatus, Student, StudentRoster, TeacherProfile};
pub use error::{
    ConfigError, IdentityError, LessonbookError, LessonbookResult, LiveSourceError, ResolveError,
};
pub use identity::{
    to_internal_identity, to_internal_identity_opt, IdCategory, InternalIdentity, NamespacedId,
    NamespacedIdGenerator, DEV_IDENTITY, IDENTITY_NAMESPACE,
};
pub use mode::Mode;
pub use telemetry::{init_tracing, LogFormat};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
