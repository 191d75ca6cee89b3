//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    BulkParts, DeleteParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::opensearch::queries::build_search_query;
use search_sync_shared::{DocumentId, IndexedDocument, SearchQuery, SearchResponse};

/// Connection options for the OpenSearch transport.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Basic auth username and password.
    pub credentials: Option<(String, String)>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

/// OpenSearch client implementation.
///
/// Documents are stored under their numeric id rendered as a string, so every
/// write for a given id replaces the previous version.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::default()).await?;
/// client.ensure_index_exists().await?;
/// client.upsert(&document).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index name and write behavior
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchError> {
        Self::with_options(url, index_config, ConnectionOptions::default()).await
    }

    /// Create a new client with authentication and timeout options.
    pub async fn with_options(
        url: &str,
        index_config: IndexConfig,
        options: ConnectionOptions,
    ) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();

        if let Some((username, password)) = options.credentials {
            builder = builder.auth(Credentials::Basic(username, password));
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Name of the index this client writes to.
    pub fn index_name(&self) -> &str {
        &self.index_config.name
    }

    fn document_id(id: DocumentId) -> String {
        id.to_string()
    }

    fn refresh(&self) -> Refresh {
        if self.index_config.refresh_on_write {
            Refresh::True
        } else {
            Refresh::False
        }
    }

    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Send one bulk request for a chunk of documents.
    async fn bulk_chunk(&self, documents: &[IndexedDocument]) -> Result<(), SearchError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

        for doc in documents {
            let source = serde_json::to_value(doc)
                .map_err(|e| SearchError::SerializationError(e.to_string()))?;
            body.push(json!({ "index": { "_id": Self::document_id(doc.id) } }).into());
            body.push(source.into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .refresh(self.refresh())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            ))
            .with_status(status.as_u16()));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Self::check_bulk_result(&result, documents.len())
    }

    /// Collapse a bulk response into a single aggregate result.
    fn check_bulk_result(result: &Value, sent: usize) -> Result<(), SearchError> {
        if !result["errors"].as_bool().unwrap_or(false) {
            return Ok(());
        }

        let failures: Vec<&Value> = result["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["index"]["error"].as_object().map(|_| item))
                    .collect()
            })
            .unwrap_or_default();

        let first = failures.first().map(|item| &item["index"]);
        let first_reason = first
            .and_then(|item| item["error"]["reason"].as_str())
            .unwrap_or("unknown reason");

        let err = SearchError::bulk_index(format!(
            "{} of {} documents failed to index (first error: {})",
            failures.len(),
            sent,
            first_reason
        ));

        // Classify the batch by the status of its first failed item.
        match first
            .and_then(|item| item["status"].as_u64())
            .and_then(|code| u16::try_from(code).ok())
        {
            Some(code) => Err(err.with_status(code)),
            None => Err(err),
        }
    }

    /// Parse a raw search response into a `SearchResponse`.
    fn parse_search_response(result: &Value, query: &str) -> Result<SearchResponse, SearchError> {
        let hits = result
            .get("hits")
            .ok_or_else(|| SearchError::parse("Invalid search response format: missing hits"))?;

        // `hits.total` is an object on current clusters and a bare number on old ones
        let total = hits["total"]["value"]
            .as_u64()
            .or_else(|| hits["total"].as_u64())
            .unwrap_or(0);

        let took_ms = result["took"].as_u64().unwrap_or(0);

        let documents = hits["hits"]
            .as_array()
            .map(|hits| hits.iter().filter_map(Self::parse_hit).collect())
            .unwrap_or_default();

        Ok(SearchResponse {
            documents,
            total,
            took_ms,
            query: query.to_string(),
        })
    }

    fn parse_hit(hit: &Value) -> Option<IndexedDocument> {
        match serde_json::from_value(hit["_source"].clone()) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(hit_id = %hit["_id"], error = %e, "Skipping unparseable search hit");
                None
            }
        }
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self, query), fields(query = %query.query(), scope = %query.scope()))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let body = build_search_query(query);

        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.name.as_str()]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            ))
            .with_status(status.as_u16()));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let parsed = Self::parse_search_response(&result, query.query())?;
        debug!(
            total = parsed.total,
            returned = parsed.documents.len(),
            took_ms = parsed.took_ms,
            "Search completed"
        );
        Ok(parsed)
    }

    async fn upsert(&self, document: &IndexedDocument) -> Result<(), SearchError> {
        let doc_id = Self::document_id(document.id);

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.name, &doc_id))
            .body(document)
            .refresh(self.refresh())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            ))
            .with_status(status.as_u16()));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    async fn bulk_upsert(&self, documents: &[IndexedDocument]) -> Result<(), SearchError> {
        if documents.is_empty() {
            return Ok(());
        }

        for chunk in documents.chunks(self.index_config.max_bulk_size.max(1)) {
            self.bulk_chunk(chunk).await?;
        }

        debug!(count = documents.len(), "Documents bulk indexed");
        Ok(())
    }

    async fn remove(&self, id: DocumentId) -> Result<(), SearchError> {
        let doc_id = Self::document_id(id);

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.name, &doc_id))
            .refresh(self.refresh())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - the document is already gone
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            ))
            .with_status(status.as_u16()));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        let index = self.index_config.name.as_str();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        match exists.status_code().as_u16() {
            200 => {
                debug!(index = %index, "Index already exists");
                return Ok(());
            }
            404 => {}
            other => {
                return Err(SearchError::index_creation(format!(
                    "Index existence check returned status {}",
                    other
                )));
            }
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %index, "Created search index");
            return Ok(());
        }

        let error_body = Self::error_body(response).await;

        // Another instance created the index between our check and create
        if error_body.contains("resource_already_exists_exception") {
            debug!(index = %index, "Index was created concurrently");
            return Ok(());
        }

        error!(status = %status, body = %error_body, "Index creation failed");
        Err(SearchError::index_creation(format!(
            "Index creation failed with status {}: {}",
            status, error_body
        )))
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}
