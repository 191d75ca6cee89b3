//! Document store HTTP client.
//!
//! Reads canonical documents from the document service:
//!
//! - `GET {base}/documents/{id}` - a single document, or 404
//! - `GET {base}/documents?page=P&limit=L` - `{documents, total, page, limit}`
//!
//! `get_all` walks the paginated listing until the reported total is reached.
//! - `GET {base}/health` - liveness probe

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::DocumentStore;
use crate::types::DocumentPage;
use search_sync_shared::{CanonicalDocument, DocumentId};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default page size used by `get_all`.
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for the document store client.
#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    /// Base URL the document routes hang off (e.g. "http://docs:8081").
    pub base_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Page size `get_all` requests while walking the listing.
    pub page_size: u32,
}

impl DocumentStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Body of a paginated listing.
#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    #[serde(default)]
    documents: Vec<CanonicalDocument>,
    #[serde(default)]
    total: Option<u64>,
}

/// Document store client over HTTP.
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl HttpDocumentStore {
    /// Create a new client for the store at `config.base_url`.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpDocumentStore)` - A new client instance
    /// * `Err(StoreError)` - If the URL is invalid or the HTTP client cannot be built
    pub fn new(config: DocumentStoreConfig) -> Result<Self, StoreError> {
        Url::parse(&config.base_url)
            .map_err(|e| StoreError::invalid_request(format!("Invalid base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::transport(e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "Created document store client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            page_size: config.page_size.max(1),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turn a non-success response into a `StoreError::Status`.
    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Document store request failed");
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(&self, id: DocumentId) -> Result<CanonicalDocument, StoreError> {
        let response = self.get(&format!("/documents/{}", id)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(document_id = id, "Document not found in store");
            return Err(StoreError::NotFound(id));
        }

        let response = Self::check_status(response).await?;
        let document: CanonicalDocument = response
            .json()
            .await
            .map_err(|e| StoreError::decode(e.to_string()))?;

        Ok(document)
    }

    async fn get_page(&self, page: u32, page_size: u32) -> Result<DocumentPage, StoreError> {
        if page == 0 {
            return Err(StoreError::invalid_request("pages are 1-indexed"));
        }
        if page_size == 0 {
            return Err(StoreError::invalid_request("page size must be positive"));
        }

        let response = self
            .get("/documents")
            .query(&[("page", page), ("limit", page_size)])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let listing: DocumentListResponse = response
            .json()
            .await
            .map_err(|e| StoreError::decode(e.to_string()))?;

        debug!(
            page = page,
            page_size = page_size,
            returned = listing.documents.len(),
            "Fetched document page"
        );

        Ok(DocumentPage {
            documents: listing.documents,
            page,
            page_size,
            total: listing.total,
        })
    }

    async fn get_all(&self) -> Result<Vec<CanonicalDocument>, StoreError> {
        let mut documents = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = self.get_page(page, self.page_size).await?;
            if batch.is_empty() {
                break;
            }

            // The store may cap the page size, so prefer its reported total
            // over a short page when deciding whether more remain.
            let done = match batch.total {
                Some(total) => (documents.len() + batch.len()) as u64 >= total,
                None => batch.is_last_page(),
            };

            documents.extend(batch.documents);
            if done {
                break;
            }
            page += 1;
        }

        debug!(count = documents.len(), pages = page, "Fetched all documents");
        Ok(documents)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self.get("/health").send().await?;
        Ok(response.status().is_success())
    }
}
