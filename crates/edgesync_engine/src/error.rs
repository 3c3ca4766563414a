//! Error types for the sync engine.

use edgesync_core::StoreError;
use edgesync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while applying or constructing sync messages.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The message or event kind cannot be handled. Never retried.
    #[error("unsupported {kind} message: {detail}")]
    Unsupported {
        /// Message or event kind.
        kind: &'static str,
        /// What was not understood.
        detail: String,
    },

    /// A sync event was rejected before being stored.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A collaborator call failed.
    #[error("store error while processing {context}: {source}")]
    Store {
        /// Debug rendering of the message or event being processed.
        context: String,
        /// Underlying failure.
        #[source]
        source: StoreError,
    },

    /// Embedded JSON or an enum string could not be interpreted.
    #[error("decode error while processing {context}: {message}")]
    Decode {
        /// Debug rendering of the message or event being processed.
        context: String,
        /// What went wrong.
        message: String,
    },

    /// Batch encoding failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl SyncError {
    /// Creates an unsupported-kind error.
    pub fn unsupported(kind: &'static str, detail: impl ToString) -> Self {
        Self::Unsupported {
            kind,
            detail: detail.to_string(),
        }
    }

    /// Creates a decode error.
    pub fn decode(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Wraps a store failure, classifying value errors as decode failures.
    pub fn from_store(context: impl Into<String>, source: StoreError) -> Self {
        match source {
            StoreError::InvalidValue { .. } | StoreError::Serialization(_) => Self::Decode {
                context: context.into(),
                message: source.to_string(),
            },
            StoreError::Unavailable(_) | StoreError::Constraint(_) => Self::Store {
                context: context.into(),
                source,
            },
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Store { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::from_store("m", StoreError::Unavailable("down".into())).is_retryable());
        assert!(!SyncError::from_store("m", StoreError::Constraint("dup".into())).is_retryable());
        assert!(!SyncError::unsupported("asset", "UNRECOGNIZED(9)").is_retryable());
        assert!(!SyncError::Validation("empty action".into()).is_retryable());
    }

    #[test]
    fn value_errors_become_decode_failures() {
        let err = SyncError::from_store(
            "AlarmUpdateMsg { .. }",
            StoreError::InvalidValue {
                field: "severity",
                value: "LOUD".into(),
            },
        );
        assert!(matches!(err, SyncError::Decode { .. }));
        assert!(err.to_string().contains("AlarmUpdateMsg"));
    }

    #[test]
    fn error_display() {
        let err = SyncError::unsupported("asset", "UNRECOGNIZED(9)");
        assert_eq!(err.to_string(), "unsupported asset message: UNRECOGNIZED(9)");
    }
}
