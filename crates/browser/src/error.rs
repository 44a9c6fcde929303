//! Error types for browser operations.

use protocol::ProtocolError;
use thiserror::Error;

/// Errors reported by browser operations.
///
/// None of these end the session: every operation restores its loading and
/// progress state before returning one.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The request could not complete.
    #[error("network failure: {0}")]
    Network(String),

    /// The service refused the request. Carries the service's text verbatim.
    #[error("{0}")]
    Rejected(String),

    /// An upload batch failed as a whole.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Another upload batch is still in flight.
    #[error("an upload is already in progress")]
    UploadInProgress,

    /// A directory fetch is still in flight.
    #[error("a directory fetch is already in progress")]
    Busy,

    /// The call was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Nothing exists at the path.
    #[error("path not found: {0}")]
    NotFound(String),

    /// The operation needs a file but got a directory.
    #[error("path is a directory: {0}")]
    IsADirectory(String),

    /// Saving a downloaded payload failed.
    #[error("failed to save {name}: {reason}")]
    Save { name: String, reason: String },
}

impl From<ProtocolError> for BrowserError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Rejected { message, .. } => BrowserError::Rejected(message),
            other => BrowserError::Network(other.to_string()),
        }
    }
}

/// Result type alias for browser operations.
pub type BrowserResult<T> = Result<T, BrowserError>;
