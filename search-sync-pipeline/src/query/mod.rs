//! Search query service.
//!
//! Validates caller input before anything reaches the index.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::PipelineError;
use search_sync_repository::{SearchEngineClient, SearchError};
use search_sync_shared::{SearchRequest, SearchResponse};

/// Read-only search over the index.
pub struct SearchService {
    index: Arc<dyn SearchEngineClient>,
}

impl SearchService {
    pub fn new(index: Arc<dyn SearchEngineClient>) -> Self {
        Self { index }
    }

    /// Run a search request.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Ranked hits and the total match count
    /// * `Err(PipelineError::SearchError(SearchError::InvalidQuery))` - If the request is
    ///   invalid; the index is not contacted
    /// * `Err(PipelineError)` - If the index query failed
    #[instrument(skip(self, request), fields(query = %request.query))]
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, PipelineError> {
        let query = request.into_query().map_err(SearchError::from)?;

        let response = self.index.search(&query).await?;

        debug!(
            scope = %query.scope(),
            total = response.total,
            returned = response.documents.len(),
            took_ms = response.took_ms,
            "Search completed"
        );

        Ok(response)
    }
}
