//! Error types for the protocol crate.

use thiserror::Error;

/// Failure modes of a call to the remote file service.
#[derive(Debug, Error)]
pub enum ProtocolError {
    // Transport errors
    /// The request could not complete (connection refused, reset, DNS...).
    #[error("network failure: {0}")]
    Network(String),

    /// The request did not complete in time.
    #[error("operation timed out: {0}")]
    Timeout(String),

    // Service errors
    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status code, when the transport has one.
        status: Option<u16>,
        /// Message reported by the service, verbatim.
        message: String,
    },

    // Serialization errors
    /// Failed to serialize a request body.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Failed to deserialize a response body.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ProtocolError {
    /// Build a rejection from a status code and message.
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        ProtocolError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Returns true if the failure happened before the service could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Network(_) | ProtocolError::Timeout(_))
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Conversions from underlying crate errors

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_eof() || err.is_syntax() {
            ProtocolError::Deserialization(err.to_string())
        } else {
            ProtocolError::Serialization(err.to_string())
        }
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => ProtocolError::Timeout(err.to_string()),
            _ => ProtocolError::Network(err.to_string()),
        }
    }
}
