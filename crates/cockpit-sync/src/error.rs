//! Error types for cockpit persistence
//!
//! - [`StorageError`]: local key/value storage failures
//! - [`TransportError`]: remote store failures, with retry classification
//! - [`SyncError`]: umbrella for the service and reconciler

use std::path::PathBuf;

/// Local key/value storage failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure on a key
    #[error("storage I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be encoded or decoded
    #[error("storage value for {key} is not valid JSON: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key cannot be mapped to a file name
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn codec(key: &str, source: serde_json::Error) -> Self {
        Self::Codec {
            key: key.to_string(),
            source,
        }
    }
}

/// Remote store failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request never got a response
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded its timeout
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// Response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Client could not be built
    #[error("transport configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// Worth retrying later
    ///
    /// Network failures, timeouts and 5xx are transient. Every other status
    /// is a permanent answer for this payload.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { code, .. } => *code >= 500,
            Self::Decode(_) | Self::Config(_) => false,
        }
    }

    /// Status code, when the server answered
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Persistence service failure
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Nothing on the server and no local backup
    #[error("cockpit {0} not found on server or in local backup")]
    NotFound(String),
}

impl SyncError {
    /// Failure caused by connectivity rather than data
    #[inline]
    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(TransportError::Status { code: 503, message: String::new() }.is_retryable());
        assert!(!TransportError::Status { code: 400, message: String::new() }.is_retryable());
        assert!(!TransportError::Status { code: 413, message: String::new() }.is_retryable());
        assert!(!TransportError::Decode("x".into()).is_retryable());
    }

    #[test]
    fn offline_detection() {
        assert!(SyncError::from(TransportError::Timeout).is_offline());
        assert!(!SyncError::NotFound("c1".into()).is_offline());
    }
}
