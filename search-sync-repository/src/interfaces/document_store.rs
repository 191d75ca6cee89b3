//! Document store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::types::DocumentPage;
use search_sync_shared::{CanonicalDocument, DocumentId};

/// Read-only access to the canonical document store.
///
/// The store owns the documents; the sync service never writes to it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document.
    ///
    /// # Returns
    ///
    /// * `Ok(CanonicalDocument)` - The current version of the document
    /// * `Err(StoreError::NotFound)` - If the store has no such document
    /// * `Err(StoreError)` - On transport, status or decode failures
    async fn get_document(&self, id: DocumentId) -> Result<CanonicalDocument, StoreError>;

    /// Fetch one page of documents.
    ///
    /// Pages are 1-indexed. A page holding fewer than `page_size` documents
    /// is the last one.
    async fn get_page(&self, page: u32, page_size: u32) -> Result<DocumentPage, StoreError>;

    /// Fetch every document in one request.
    ///
    /// Convenience for small stores; full reconciliation pages instead.
    async fn get_all(&self) -> Result<Vec<CanonicalDocument>, StoreError>;

    /// Check if the document store is reachable.
    async fn health_check(&self) -> Result<bool, StoreError>;
}
