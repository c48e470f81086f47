//! Editor configuration
//!
//! Loaded from TOML. Durations are milliseconds:
//!
//! ```toml
//! endpoint = "https://cockpits.example/api"
//! debounce_ms = 1000
//! storage_dir = "/var/lib/cockpit"
//!
//! [sync]
//! max_retries = 5
//! base_delay_ms = 2000
//! ```
//!
//! `COCKPIT_ENDPOINT` overrides `endpoint`.

use crate::error::ConfigError;
use cockpit_sync::config::millis;
use cockpit_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`EditorConfig::endpoint`]
pub const ENDPOINT_ENV: &str = "COCKPIT_ENDPOINT";

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Base URL of the cockpit store; `None` keeps every write queued
    pub endpoint: Option<String>,

    /// Quiet period before a debounced save
    #[serde(rename = "debounce_ms", with = "millis")]
    pub debounce: Duration,

    /// Directory for the durable queue and backups; in-memory when unset
    pub storage_dir: Option<PathBuf>,

    pub sync: SyncConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            debounce: Duration::from_millis(1000),
            storage_dir: None,
            sync: SyncConfig::default(),
        }
    }
}

impl EditorConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, `ConfigError::Invalid` on
    /// values that fail [`EditorConfig::validate`]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, then apply environment overrides
    ///
    /// # Errors
    /// Read, parse or validation failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        tracing::debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.endpoint = Some(endpoint);
        }
    }

    /// Reject values the pipeline cannot run with
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field: "endpoint",
                    reason: format!("expected an http(s) URL, got {endpoint:?}"),
                });
            }
        }
        if self.sync.max_retries == 0 {
            return Err(ConfigError::Invalid {
                field: "sync.max_retries",
                reason: "must be at least 1".into(),
            });
        }
        if self.sync.base_delay > self.sync.max_delay {
            return Err(ConfigError::Invalid {
                field: "sync.base_delay_ms",
                reason: "exceeds sync.max_delay_ms".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EditorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.debounce, Duration::from_millis(1000));
        assert_eq!(config.sync.max_retries, 5);
    }

    #[test]
    fn durations_are_milliseconds() {
        let config = EditorConfig::from_toml_str(
            r#"
            endpoint = "https://cockpits.example/api"
            debounce_ms = 250

            [sync]
            base_delay_ms = 500
            max_delay_ms = 10000
            "#,
        )
        .unwrap();
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.sync.base_delay, Duration::from_millis(500));
        assert_eq!(config.sync.max_delay, Duration::from_secs(10));
        assert_eq!(config.sync.max_retries, 5);
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = EditorConfig::from_toml_str(r#"endpoint = "ftp://x""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "endpoint", .. }));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = EditorConfig::from_toml_str("debounce_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_endpoint() {
        let mut config = EditorConfig::new().with_endpoint("https://a.example");
        config.apply_env_overrides(|key| (key == ENDPOINT_ENV).then(|| "https://b.example".into()));
        assert_eq!(config.endpoint.as_deref(), Some("https://b.example"));

        config.apply_env_overrides(|_| Some("  ".into()));
        assert_eq!(config.endpoint.as_deref(), Some("https://b.example"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = 300").unwrap();
        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.debounce, Duration::from_millis(300));

        let err = EditorConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
