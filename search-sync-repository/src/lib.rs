//! # Search Sync Repository
//!
//! This crate provides the traits and implementations for the two external
//! dependencies of the sync service: the search index, written to and
//! queried through `SearchEngineClient` (OpenSearch implementation), and
//! the canonical document store, read through `DocumentStore` (HTTP
//! implementation).

pub mod docstore;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use docstore::{DocumentStoreConfig, HttpDocumentStore};
pub use errors::{SearchError, StoreError};
pub use interfaces::{DocumentStore, SearchEngineClient};
pub use crate::opensearch::{ConnectionOptions, IndexConfig, OpenSearchClient};
pub use types::DocumentPage;
