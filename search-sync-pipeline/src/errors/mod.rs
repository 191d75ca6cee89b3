//! Error types for the search sync pipeline.

use search_sync_repository::{SearchError, StoreError};
use thiserror::Error;

/// Errors that can occur in the search sync pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error from the search index.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Error from the document store.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),
}

impl PipelineError {
    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Whether a later retry of the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::SearchError(e) => e.is_transient(),
            PipelineError::StoreError(e) => e.is_transient(),
            PipelineError::KafkaError(_) => true,
        }
    }
}

impl From<rdkafka::error::KafkaError> for PipelineError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}
