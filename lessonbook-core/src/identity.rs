//! Identity types for lessonbook records.
//!
//! Two identity spaces meet here: the textual identity issued by the
//! authentication provider, and the canonical UUID-shaped identity that
//! backend rows and cache entries are keyed on. [`to_internal_identity`] is
//! the only bridge between them.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentityError;

/// Namespace for name-based internal identities.
///
/// Changing this value re-keys every backend row owned by a mapped identity.
pub const IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6c65_7373_6f6e_4b00_8000_6964_656e_7469);

/// Well-known identity used as the current actor in augmented mode.
pub const DEV_IDENTITY: InternalIdentity =
    InternalIdentity(Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001));

/// Canonical internal identity (8-4-4-4-12 lowercase hex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalIdentity(Uuid);

impl InternalIdentity {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for InternalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for InternalIdentity {
    type Err = IdentityError;

    /// Parse an already-mapped identity. This does not map external input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|e| IdentityError::Malformed {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Map an external identity onto the internal identity space.
///
/// Every non-empty input goes through the same name-based hash, including
/// input that already looks like a UUID or is only whitespace. Only the empty
/// string is rejected.
pub fn to_internal_identity(external: &str) -> Result<InternalIdentity, IdentityError> {
    if external.is_empty() {
        return Err(IdentityError::EmptyInput);
    }
    Ok(InternalIdentity(Uuid::new_v5(
        &IDENTITY_NAMESPACE,
        external.as_bytes(),
    )))
}

/// Same as [`to_internal_identity`] for an identity that may be absent.
pub fn to_internal_identity_opt(
    external: Option<&str>,
) -> Result<InternalIdentity, IdentityError> {
    external
        .ok_or(IdentityError::EmptyInput)
        .and_then(to_internal_identity)
}

// ============================================================================
// NAMESPACED IDS
// ============================================================================

/// Category prefix for synthetic record identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdCategory {
    Teacher,
    Student,
    Lesson,
    Booking,
}

impl IdCategory {
    pub const ALL: [IdCategory; 4] = [
        IdCategory::Teacher,
        IdCategory::Student,
        IdCategory::Lesson,
        IdCategory::Booking,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            IdCategory::Teacher => "teacher",
            IdCategory::Student => "student",
            IdCategory::Lesson => "lesson",
            IdCategory::Booking => "booking",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.prefix() == prefix)
    }

    fn index(&self) -> usize {
        match self {
            IdCategory::Teacher => 0,
            IdCategory::Student => 1,
            IdCategory::Lesson => 2,
            IdCategory::Booking => 3,
        }
    }
}

impl fmt::Display for IdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Identifier of a synthetic (mock or seed) record.
///
/// The category is part of the identifier itself, so ids from different
/// categories can never be equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespacedId {
    category: IdCategory,
    suffix: String,
}

impl NamespacedId {
    /// Deterministic id for the `n`th record of a category.
    pub fn sequence(category: IdCategory, n: u64) -> Self {
        Self {
            category,
            suffix: format!("{:04}", n),
        }
    }

    /// Unique, time-ordered id.
    pub fn opaque(category: IdCategory) -> Self {
        Self {
            category,
            suffix: Uuid::now_v7().simple().to_string(),
        }
    }

    pub fn category(&self) -> IdCategory {
        self.category
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for NamespacedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category.prefix(), self.suffix)
    }
}

impl FromStr for NamespacedId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| IdentityError::Malformed {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (prefix, suffix) = s
            .split_once('_')
            .ok_or_else(|| malformed("missing category separator"))?;
        let category = IdCategory::from_prefix(prefix)
            .ok_or_else(|| IdentityError::UnknownCategory(prefix.to_string()))?;
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed("suffix must be non-empty ASCII alphanumeric"));
        }

        Ok(Self {
            category,
            suffix: suffix.to_string(),
        })
    }
}

impl TryFrom<String> for NamespacedId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NamespacedId> for String {
    fn from(id: NamespacedId) -> Self {
        id.to_string()
    }
}

/// Hands out sequence ids, never repeating one within a category.
#[derive(Debug, Default)]
pub struct NamespacedIdGenerator {
    counters: [AtomicU64; 4],
}

impl NamespacedIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for `category`, starting at 1.
    pub fn next(&self, category: IdCategory) -> NamespacedId {
        let n = self.counters[category.index()].fetch_add(1, Ordering::Relaxed) + 1;
        NamespacedId::sequence(category, n)
    }

    /// Number of ids issued so far for `category`.
    pub fn issued(&self, category: IdCategory) -> u64 {
        self.counters[category.index()].load(Ordering::Relaxed)
    }
}

// =============================================================================
// TESTS
// =============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
