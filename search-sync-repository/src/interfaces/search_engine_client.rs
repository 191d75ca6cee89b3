//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, in-memory, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use search_sync_shared::{DocumentId, IndexedDocument, SearchQuery, SearchResponse};

/// Abstract interface for search engine operations.
///
/// Every write is a full-document replacement keyed by document id, so
/// applying the same document repeatedly, or from concurrent callers, always
/// converges on the last write the index observed.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Execute a search query against the index.
    ///
    /// # Arguments
    ///
    /// * `query` - The validated query including text, scope, pagination and author filter
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Ranked documents, total match count and elapsed time
    /// * `Err(SearchError)` - If the search fails
    ///
    /// # Example
    ///
    /// ```ignore
    /// let query = SearchQuery::new("kafka")?.with_scope(SearchScope::Title);
    /// let response = client.search(&query).await?;
    /// println!("Found {} results", response.total);
    /// ```
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;

    /// Create or fully replace the document at `document.id`.
    ///
    /// Succeeds whether or not a previous version exists.
    async fn upsert(&self, document: &IndexedDocument) -> Result<(), SearchError>;

    /// Upsert many documents using a batched request.
    ///
    /// Semantically equivalent to calling `upsert` for each element. Any
    /// per-document failure is reported as a single aggregate
    /// `SearchError::BulkIndexError`; retrying the whole batch is safe.
    async fn bulk_upsert(&self, documents: &[IndexedDocument]) -> Result<(), SearchError>;

    /// Delete a document from the index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted or did not exist
    /// * `Err(SearchError)` - If the index could not be reached or refused the delete
    async fn remove(&self, id: DocumentId) -> Result<(), SearchError>;

    /// Ensure the search index exists with proper mappings.
    ///
    /// Creates the index when absent; a no-op when it already exists.
    /// This should be called during application startup.
    async fn ensure_index_exists(&self) -> Result<(), SearchError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine answered but reported a problem
    /// * `Err(SearchError)` - If the health check could not be executed
    async fn health_check(&self) -> Result<bool, SearchError>;
}
