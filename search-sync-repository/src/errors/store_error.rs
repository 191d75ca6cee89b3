//! Document store error types.

use search_sync_shared::DocumentId;
use thiserror::Error;

/// Errors that can occur while reading from the document store.
///
/// `NotFound` is kept distinct from transport failures so callers can tell
/// "nothing to sync" apart from "try again later".
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("Document {0} not found")]
    NotFound(DocumentId),

    /// The store could not be reached or did not answer in time.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store answered with an unexpected status.
    #[error("Document store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request was rejected before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Whether the failure is a transport problem worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Status { status, .. } => *status >= 500 || *status == 429,
            StoreError::NotFound(_) | StoreError::Decode(_) | StoreError::InvalidRequest(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
