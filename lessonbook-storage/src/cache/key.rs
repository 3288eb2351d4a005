//! Namespaced cache keys.
//!
//! A [`CacheKey`] names a logical entity class ("teacher_profile",
//! "students"). The storage key is the configured namespace followed by the
//! logical name, so distinct logical names always land on distinct storage
//! keys and nothing outside the namespace is ever touched.

use std::fmt;

/// Logical name of a cached entity class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    logical_name: String,
}

impl CacheKey {
    /// Create a key for `logical_name`.
    ///
    /// Returns `None` for an empty or blank name.
    pub fn new(logical_name: impl Into<String>) -> Option<Self> {
        let logical_name = logical_name.into();
        if logical_name.trim().is_empty() {
            return None;
        }
        Some(Self { logical_name })
    }

    /// Key for a compile-time logical name.
    ///
    /// # Panics
    ///
    /// Panics if `logical_name` is blank. Only used with literals.
    pub fn from_static(logical_name: &'static str) -> Self {
        match Self::new(logical_name) {
            Some(key) => key,
            None => panic!("cache key literal must not be blank"),
        }
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Full storage key under `namespace`.
    pub fn storage_key(&self, namespace: &str) -> String {
        let mut key = String::with_capacity(namespace.len() + self.logical_name.len());
        key.push_str(namespace);
        key.push_str(&self.logical_name);
        key
    }

    /// Recover the key from a storage key, if it belongs to `namespace`.
    pub fn from_storage_key(namespace: &str, storage_key: &str) -> Option<Self> {
        storage_key
            .strip_prefix(namespace)
            .and_then(|name| Self::new(name))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.logical_name)
    }
}
