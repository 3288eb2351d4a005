//! Error types for lessonbook operations

use thiserror::Error;

/// Identity mapping and parsing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("External identity is empty or absent")]
    EmptyInput,

    #[error("Malformed identifier {value:?}: {reason}")]
    Malformed { value: String, reason: String },

    #[error("Unknown identifier category: {0}")]
    UnknownCategory(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Failure reported by a live data source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LiveSourceError {
    #[error("Live source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Backend rejected request with status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Failed to decode live response: {reason}")]
    Decode { reason: String },
}

impl LiveSourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Errors that cross the resolution boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Not authenticated: no session identity in strict mode")]
    AuthRequired,

    #[error("Authentication context is not ready")]
    AuthPending,

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Live source error for {logical_name}: {source}")]
    LiveSource {
        logical_name: String,
        #[source]
        source: LiveSourceError,
    },
}

impl ResolveError {
    /// True for failures the surrounding application shows as "not authenticated".
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::AuthPending)
    }
}

/// Master error type for all lessonbook errors.
#[derive(Debug, Error)]
pub enum LessonbookError {
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

/// Result type alias for lessonbook operations.
pub type LessonbookResult<T> = Result<T, LessonbookError>;

// =============================================================================
// TESTS
// =============================================================================
