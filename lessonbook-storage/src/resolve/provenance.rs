//! Provenance tags for resolved values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why the pipeline moved past the live source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// Live source answered with no data.
    Empty,
    /// Live source failed.
    Error,
}

/// Which source satisfied a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Live,
    /// Cached value after an empty live result.
    Cached,
    /// Cached value after a live failure.
    CachedFallback,
    /// Mock dataset after an empty live result.
    Mock,
    /// Mock dataset after a live failure.
    MockFallback,
}

impl Provenance {
    pub fn cached(reason: FallbackReason) -> Self {
        match reason {
            FallbackReason::Empty => Self::Cached,
            FallbackReason::Error => Self::CachedFallback,
        }
    }

    pub fn mock(reason: FallbackReason) -> Self {
        match reason {
            FallbackReason::Empty => Self::Mock,
            FallbackReason::Error => Self::MockFallback,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached | Self::CachedFallback)
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock | Self::MockFallback)
    }

    /// True when the live source failed.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::CachedFallback | Self::MockFallback)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cached => "cached",
            Self::CachedFallback => "cached-fallback",
            Self::Mock => "mock",
            Self::MockFallback => "mock-fallback",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved value and where it came from.
///
/// `value` is `None` only for an absent live result in strict mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    value: Option<T>,
    source: Provenance,
}

impl<T> Resolved<T> {
    pub fn new(value: Option<T>, source: Provenance) -> Self {
        Self { value, source }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn source(&self) -> Provenance {
        self.source
    }

    pub fn into_parts(self) -> (Option<T>, Provenance) {
        (self.value, self.source)
    }
}
