//! Single-document synchronization.
//!
//! The store is always re-read; event payloads are never trusted as content.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;
use search_sync_repository::{DocumentStore, SearchEngineClient, StoreError};
use search_sync_shared::{DocumentId, IndexedDocument};

/// What a sync did to the index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The current store version was written to the index.
    Indexed,
    /// The document no longer exists in the store and was removed.
    Removed,
}

/// Applies store state to the search index one document at a time.
///
/// Every write is a full-document upsert or an idempotent delete, so
/// concurrent syncs of the same id from the ingester and the reconciler
/// cannot leave a partial entry behind.
pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchEngineClient>,
}

impl SyncEngine {
    /// Create a new sync engine over the given gateways.
    pub fn new(store: Arc<dyn DocumentStore>, index: Arc<dyn SearchEngineClient>) -> Self {
        Self { store, index }
    }

    /// Make the index entry for `id` match the store.
    ///
    /// # Arguments
    ///
    /// * `id` - The document to synchronize
    ///
    /// # Returns
    ///
    /// * `Ok(SyncOutcome::Indexed)` - The projection of the current store version was upserted
    /// * `Ok(SyncOutcome::Removed)` - The store no longer has the document; its entry is gone
    /// * `Err(PipelineError)` - If the store read failed for any other reason, or the index write failed
    #[instrument(skip(self))]
    pub async fn sync_document(&self, id: DocumentId) -> Result<SyncOutcome, PipelineError> {
        match self.store.get_document(id).await {
            Ok(document) => {
                let indexed = IndexedDocument::from(document);
                self.index.upsert(&indexed).await?;
                debug!(document_id = id, "Indexed document");
                Ok(SyncOutcome::Indexed)
            }
            Err(StoreError::NotFound(_)) => {
                info!(
                    document_id = id,
                    "Document missing from store, removing from index"
                );
                self.index.remove(id).await?;
                Ok(SyncOutcome::Removed)
            }
            Err(e) => {
                warn!(document_id = id, error = %e, "Failed to read document from store");
                Err(e.into())
            }
        }
    }

    /// Remove `id` from the index. Removing an absent document succeeds.
    #[instrument(skip(self))]
    pub async fn delete_document(&self, id: DocumentId) -> Result<(), PipelineError> {
        self.index.remove(id).await?;
        debug!(document_id = id, "Removed document from index");
        Ok(())
    }
}
