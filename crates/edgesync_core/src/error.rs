//! Error types for EdgeSync collaborators.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by entity stores and other collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A stored or transmitted value could not be interpreted.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Field being parsed.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the operation may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
