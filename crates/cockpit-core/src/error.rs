//! Error types for the cockpit editor
//!
//! Edits on unknown ids are not errors here either: they return `false` or
//! `None`. Errors cover loading documents and building the pipeline.

use cockpit_sync::{StorageError, SyncError, TransportError};
use std::path::PathBuf;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`crate::EditorConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but makes no sense
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Editor errors
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<StorageError> for EditorError {
    fn from(err: StorageError) -> Self {
        Self::Sync(err.into())
    }
}

impl From<TransportError> for EditorError {
    fn from(err: TransportError) -> Self {
        Self::Sync(err.into())
    }
}

impl EditorError {
    /// True when retrying later can succeed without user action
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Sync(e) => e.is_offline(),
            Self::Config(_) => false,
        }
    }
}
