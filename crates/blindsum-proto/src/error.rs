//! Error types for wire message encoding and decoding.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from JSON message handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Message could not be serialized to JSON.
    #[error("JSON encode error: {0}")]
    JsonEncode(String),

    /// Incoming text was not a recognizable protocol message.
    #[error("JSON decode error: {0}")]
    JsonDecode(String),
}
