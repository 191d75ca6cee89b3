//! Search error types.
//!
//! This module defines the error types that can occur during search index operations.

use search_sync_shared::QueryError;
use thiserror::Error;

/// Errors that can occur during search engine operations.
///
/// Failures that came back as an HTTP response carry the status code, which
/// is what [`SearchError::is_transient`] classifies on.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to reach the search engine (connection refused, timeout).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Search query execution failed.
    #[error("Query error: {message}")]
    QueryError { status: Option<u16>, message: String },

    /// Failed to index a single document.
    #[error("Index error: {message}")]
    IndexError { status: Option<u16>, message: String },

    /// Bulk indexing operation had failures.
    #[error("Bulk index error: {message}")]
    BulkIndexError { status: Option<u16>, message: String },

    /// Failed to delete a document.
    #[error("Delete error: {message}")]
    DeleteError { status: Option<u16>, message: String },

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse response from search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The provided query is invalid.
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError {
            status: None,
            message: msg.into(),
        }
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError {
            status: None,
            message: msg.into(),
        }
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Attach the HTTP status the search engine answered with.
    ///
    /// Only applies to query, index, bulk index and delete errors; other
    /// variants are returned unchanged.
    pub fn with_status(mut self, code: u16) -> Self {
        match &mut self {
            SearchError::QueryError { status, .. }
            | SearchError::IndexError { status, .. }
            | SearchError::BulkIndexError { status, .. }
            | SearchError::DeleteError { status, .. } => *status = Some(code),
            _ => {}
        }
        self
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::QueryError { status, .. }
            | SearchError::IndexError { status, .. }
            | SearchError::BulkIndexError { status, .. }
            | SearchError::DeleteError { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the failure is a transport problem worth retrying later.
    ///
    /// Connection failures and timeouts are transient, as are responses
    /// with status 429 or 5xx. Nothing is inferred from message text.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::ConnectionError(_) => true,
            _ => matches!(self.status(), Some(code) if code == 429 || code >= 500),
        }
    }
}
