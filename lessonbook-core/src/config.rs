//! Runtime configuration.
//!
//! Resolved exactly once at process start and handed to components by value.
//! An optional TOML file supplies cache settings; the
//! `LESSONBOOK_AUGMENTED_MODE` environment entry decides the mode.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::identity::{InternalIdentity, DEV_IDENTITY};
use crate::mode::Mode;

/// Environment entry selecting augmented mode.
pub const AUGMENTED_MODE_ENV: &str = "LESSONBOOK_AUGMENTED_MODE";

/// Environment entry pointing at an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "LESSONBOOK_CONFIG";

/// Default storage namespace for cache entries.
pub const DEFAULT_CACHE_NAMESPACE: &str = "lessonbook.cache.";

/// Default freshness window for cached entries: one calendar day.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache settings shared with the storage crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub namespace: String,
    pub freshness_window: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }
}

impl CacheSettings {
    /// The namespace must be non-blank and end in a delimiter (`.`, `:`, `/`,
    /// `_`) so bulk invalidation cannot reach unrelated keys. The window must
    /// be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_namespace(&self.namespace)?;
        if self.freshness_window.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache.freshness_window_secs".to_string(),
                value: "0".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        field: "cache.namespace".to_string(),
        value: namespace.to_string(),
        reason: reason.to_string(),
    };

    if namespace.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if !namespace.ends_with(['.', ':', '/', '_']) {
        return Err(invalid("must end with one of '.', ':', '/', '_'"));
    }
    Ok(())
}

/// Process-wide configuration, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub mode: Mode,
    /// Actor used in augmented mode in place of a session identity.
    pub dev_identity: InternalIdentity,
    pub cache: CacheSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Strict,
            dev_identity: DEV_IDENTITY,
            cache: CacheSettings::default(),
        }
    }
}

/// On-disk shape. Every field is optional; the mode is not file-configurable.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    dev_identity: Option<String>,
    cache: Option<FileCacheConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileCacheConfig {
    namespace: Option<String>,
    freshness_window_secs: Option<u64>,
}

impl RuntimeConfig {
    /// Resolve configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => Self::from_path(Path::new(&path))?,
            _ => Self::default(),
        };

        config.mode = match lookup(AUGMENTED_MODE_ENV) {
            Some(raw) => Mode::from_augmented_flag(parse_flag(AUGMENTED_MODE_ENV, &raw)?),
            None => Mode::Strict,
        };

        config.validate()?;
        Ok(config)
    }

    /// Read settings from a TOML file. The mode stays strict.
    ///
    /// The result is validated; an invalid cache section is an error.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(raw) = file.dev_identity {
            config.dev_identity = raw.parse().map_err(|e| ConfigError::InvalidValue {
                field: "dev_identity".to_string(),
                value: raw.clone(),
                reason: format!("{}", e),
            })?;
        }
        if let Some(cache) = file.cache {
            if let Some(namespace) = cache.namespace {
                config.cache.namespace = namespace;
            }
            if let Some(secs) = cache.freshness_window_secs {
                config.cache.freshness_window = Duration::from_secs(secs);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()
    }
}

fn parse_flag(field: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_flag_is_strict() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[])).expect("valid config");
        assert_eq!(config.mode, Mode::Strict);
        assert_eq!(config.cache, CacheSettings::default());
        assert_eq!(config.dev_identity, DEV_IDENTITY);
    }

    #[test]
    fn test_flag_values() {
        for raw in ["1", "true", "TRUE", "yes", "on", " true "] {
            let config = RuntimeConfig::from_lookup(lookup_from(&[(AUGMENTED_MODE_ENV, raw)]))
                .expect("valid flag");
            assert_eq!(config.mode, Mode::Augmented, "raw value {:?}", raw);
        }
        for raw in ["0", "false", "no", "off", ""] {
            let config = RuntimeConfig::from_lookup(lookup_from(&[(AUGMENTED_MODE_ENV, raw)]))
                .expect("valid flag");
            assert_eq!(config.mode, Mode::Strict, "raw value {:?}", raw);
        }
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let result = RuntimeConfig::from_lookup(lookup_from(&[(AUGMENTED_MODE_ENV, "maybe")]));
        match result {
            Err(ConfigError::InvalidValue { field, value, .. }) => {
                assert_eq!(field, AUGMENTED_MODE_ENV);
                assert_eq!(value, "maybe");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_toml_overrides() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            dev_identity = "11111111-2222-4333-8444-555555555555"

            [cache]
            namespace = "tutor:"
            freshness_window_secs = 60
            "#,
        )
        .expect("valid toml");

        assert_eq!(
            config.dev_identity.to_string(),
            "11111111-2222-4333-8444-555555555555"
        );
        assert_eq!(config.cache.namespace, "tutor:");
        assert_eq!(config.cache.freshness_window, Duration::from_secs(60));
        assert_eq!(config.mode, Mode::Strict);
    }

    #[test]
    fn test_toml_rejects_unknown_fields() {
        let result = RuntimeConfig::from_toml_str("mode = \"augmented\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_rejects_bad_dev_identity() {
        let result = RuntimeConfig::from_toml_str("dev_identity = \"not-a-uuid\"");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_file_then_env_mode() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[cache]\nnamespace = \"lb/\"").expect("write config");
        let path = file.path().to_string_lossy().to_string();

        let config = RuntimeConfig::from_lookup(lookup_from(&[
            (CONFIG_PATH_ENV, path.as_str()),
            (AUGMENTED_MODE_ENV, "1"),
        ]))
        .expect("valid config");

        assert_eq!(config.cache.namespace, "lb/");
        assert_eq!(config.mode, Mode::Augmented);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = RuntimeConfig::from_lookup(lookup_from(&[(
            CONFIG_PATH_ENV,
            "/nonexistent/lessonbook.toml",
        )]));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_namespace() {
        let mut config = RuntimeConfig::default();
        config.cache.namespace = "lessonbook".to_string();
        assert!(config.validate().is_err());

        config.cache.namespace = "   ".to_string();
        assert!(config.validate().is_err());

        config.cache.namespace = "lessonbook:".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_rejects_unsafe_namespace() {
        for toml in [
            "[cache]\nnamespace = \"\"",
            "[cache]\nnamespace = \"  \"",
            "[cache]\nnamespace = \"lessonbook\"",
        ] {
            match RuntimeConfig::from_toml_str(toml) {
                Err(ConfigError::InvalidValue { field, .. }) => {
                    assert_eq!(field, "cache.namespace", "{}", toml)
                }
                other => panic!("expected InvalidValue for {:?}, got {:?}", toml, other),
            }
        }
    }

    #[test]
    fn test_toml_rejects_zero_window() {
        let result = RuntimeConfig::from_toml_str("[cache]\nfreshness_window_secs = 0");
        match result {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "cache.freshness_window_secs")
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_file_with_unsafe_namespace_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[cache]\nnamespace = \"\"\nfreshness_window_secs = 0").expect("write");
        assert!(matches!(
            RuntimeConfig::from_path(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_cache_settings_validate() {
        assert!(CacheSettings::default().validate().is_ok());
        let settings = CacheSettings {
            namespace: "app_".to_string(),
            freshness_window: Duration::from_secs(1),
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_window() {
        let mut config = RuntimeConfig::default();
        config.cache.freshness_window = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
