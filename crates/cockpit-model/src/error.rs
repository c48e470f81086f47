//! Error types for the cockpit model

/// Model-level errors
///
/// Tree mutations on unknown ids are not errors (callers get `None`/`false`);
/// these cover malformed input and invalid index arithmetic.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Status string outside the severity order
    #[error("unknown status: '{0}'")]
    UnknownStatus(String),

    /// Reorder index outside the list
    #[error("index {index} out of bounds for list of {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Document JSON could not be decoded
    #[error("invalid cockpit document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

impl ModelError {
    /// Create out-of-bounds error
    #[inline]
    #[must_use]
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }
}
