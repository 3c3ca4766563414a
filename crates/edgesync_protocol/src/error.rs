//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding batches.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Batch could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Bytes are not a valid batch.
    #[error("decode error: {0}")]
    Decode(String),
}
