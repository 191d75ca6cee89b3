//! # Search Sync
//!
//! Entry point and configuration for the search sync service.
//!
//! This crate reads the environment, builds the index and store clients,
//! verifies both are reachable and hands them to the pipeline orchestrator.

pub mod config;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A dependency could not be reached at startup.
    #[error("Startup error: {0}")]
    StartupError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] search_sync_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_sync_repository::SearchError),

    /// Store error.
    #[error("Store error: {0}")]
    StoreError(#[from] search_sync_repository::StoreError),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a startup error.
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::StartupError(msg.into())
    }
}
