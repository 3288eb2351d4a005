//! Operating mode for data resolution.
//!
//! The mode is resolved once at startup (see [`crate::config`]) and then
//! passed by value to every component that branches on it. Nothing here
//! reads the environment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether reads may fall back to cached or mock data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Fallback to cache and mock data is permitted.
    Augmented,
    /// Live backend and authenticated identity required.
    #[default]
    Strict,
}

impl Mode {
    pub fn from_augmented_flag(augmented: bool) -> Self {
        if augmented {
            Self::Augmented
        } else {
            Self::Strict
        }
    }

    pub fn is_augmented(&self) -> bool {
        matches!(self, Self::Augmented)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }

    /// Run `augmented` in augmented mode, `otherwise` in strict mode.
    pub fn run_augmented<T>(
        &self,
        augmented: impl FnOnce() -> T,
        otherwise: impl FnOnce() -> T,
    ) -> T {
        match self {
            Self::Augmented => augmented(),
            Self::Strict => otherwise(),
        }
    }

    /// Run `strict` in strict mode, `otherwise` in augmented mode.
    pub fn run_strict<T>(&self, strict: impl FnOnce() -> T, otherwise: impl FnOnce() -> T) -> T {
        match self {
            Self::Strict => strict(),
            Self::Augmented => otherwise(),
        }
    }

    /// Emit a debug event only in augmented mode.
    pub fn log_augmented(&self, args: fmt::Arguments<'_>) {
        if self.is_augmented() {
            tracing::debug!(mode = %self, "{}", args);
        }
    }

    /// Emit a debug event only in strict mode.
    pub fn log_strict(&self, args: fmt::Arguments<'_>) {
        if self.is_strict() {
            tracing::debug!(mode = %self, "{}", args);
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Augmented => "augmented",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
