//! In-memory gateways and a scripted message source for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use crate::consumer::{MessageSource, ReceivedMessage};
use crate::errors::PipelineError;
use search_sync_repository::{
    DocumentPage, DocumentStore, SearchEngineClient, SearchError, StoreError,
};
use search_sync_shared::{
    CanonicalDocument, DocumentId, IndexedDocument, SearchQuery, SearchResponse, SearchScope,
};

pub fn canonical(id: DocumentId, title: &str, content: &str) -> CanonicalDocument {
    CanonicalDocument {
        id,
        title: title.to_string(),
        content: content.as_bytes().to_vec(),
        author: Some("bob".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            .checked_add_signed(chrono::Duration::minutes(id as i64))
            .unwrap(),
    }
}

/// Document store backed by a map, with failure injection.
#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<BTreeMap<DocumentId, CanonicalDocument>>,
    pub page_fetches: AtomicUsize,
    pub fail_transport: AtomicBool,
    /// Fail every page fetch at or after this page number (0 = never).
    pub fail_from_page: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_documents(documents: impl IntoIterator<Item = CanonicalDocument>) -> Self {
        let store = Self::default();
        for doc in documents {
            store.insert(doc);
        }
        store
    }

    pub fn insert(&self, doc: CanonicalDocument) {
        self.documents.lock().unwrap().insert(doc.id, doc);
    }

    pub fn remove(&self, id: DocumentId) {
        self.documents.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(&self, id: DocumentId) -> Result<CanonicalDocument, StoreError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(StoreError::transport("connection refused"));
        }
        self.documents
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn get_page(&self, page: u32, page_size: u32) -> Result<DocumentPage, StoreError> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);

        let fail_from = self.fail_from_page.load(Ordering::SeqCst);
        if self.fail_transport.load(Ordering::SeqCst) || (fail_from > 0 && page as usize >= fail_from)
        {
            return Err(StoreError::transport("timed out"));
        }

        let documents = self.documents.lock().unwrap();
        let skip = (page as usize - 1) * page_size as usize;
        let page_docs: Vec<CanonicalDocument> = documents
            .values()
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(DocumentPage {
            documents: page_docs,
            page,
            page_size,
            total: Some(documents.len() as u64),
        })
    }

    async fn get_all(&self) -> Result<Vec<CanonicalDocument>, StoreError> {
        Ok(self.documents.lock().unwrap().values().cloned().collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(StoreError::transport("connection refused"));
        }
        Ok(true)
    }
}

/// Search index backed by a map, with a naive token matcher.
#[derive(Default)]
pub struct InMemoryIndex {
    documents: Mutex<BTreeMap<DocumentId, IndexedDocument>>,
    pub upserts: AtomicUsize,
    pub bulk_calls: AtomicUsize,
    pub removes: AtomicUsize,
    pub searches: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl InMemoryIndex {
    pub fn get(&self, id: DocumentId) -> Option<IndexedDocument> {
        self.documents.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn seed(&self, doc: IndexedDocument) {
        self.documents.lock().unwrap().insert(doc.id, doc);
    }

    fn check_writable(&self) -> Result<(), SearchError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SearchError::connection("index unreachable"));
        }
        Ok(())
    }

    fn score(doc: &IndexedDocument, token: &str, scope: SearchScope) -> f64 {
        let title_hit = doc.title.to_lowercase().contains(token);
        let content_hit = doc.content.to_lowercase().contains(token);
        match scope {
            SearchScope::Title if title_hit => 2.0,
            SearchScope::Content if content_hit => 1.0,
            SearchScope::All => {
                (if title_hit { 2.0 } else { 0.0 }) + (if content_hit { 1.0 } else { 0.0 })
            }
            _ => 0.0,
        }
    }
}

#[async_trait]
impl SearchEngineClient for InMemoryIndex {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let token = query.query().to_lowercase();

        let mut hits: Vec<(f64, IndexedDocument)> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|doc| match query.author() {
                Some(author) => doc.author.as_deref() == Some(author),
                None => true,
            })
            .map(|doc| (Self::score(doc, &token, query.scope()), doc.clone()))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        hits.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap()
                .then_with(|| b.1.updated_at.cmp(&a.1.updated_at))
        });

        let total = hits.len() as u64;
        let documents = hits
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .map(|(_, doc)| doc)
            .collect();

        Ok(SearchResponse {
            documents,
            total,
            took_ms: 1,
            query: query.query().to_string(),
        })
    }

    async fn upsert(&self, document: &IndexedDocument) -> Result<(), SearchError> {
        self.check_writable()?;
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn bulk_upsert(&self, documents: &[IndexedDocument]) -> Result<(), SearchError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SearchError::bulk_index("1 of 1 documents failed to index"));
        }
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.documents.lock().unwrap();
        for doc in documents {
            stored.insert(doc.id, doc.clone());
        }
        Ok(())
    }

    async fn remove(&self, id: DocumentId) -> Result<(), SearchError> {
        self.check_writable()?;
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.documents.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        self.check_writable()?;
        Ok(true)
    }
}

/// Message source replaying a fixed script, then idling.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<ReceivedMessage, PipelineError>>>,
    pub committed: Mutex<Vec<i64>>,
    pub reads: AtomicUsize,
    drained: Notify,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<ReceivedMessage, PipelineError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// Wait until every scripted item has been read and handled.
    pub async fn wait_drained(&self) {
        self.drained.notified().await;
    }
}

pub fn message(offset: i64, payload: &str) -> Result<ReceivedMessage, PipelineError> {
    Ok(ReceivedMessage {
        payload: Some(payload.as_bytes().to_vec()),
        topic: "document-events".to_string(),
        partition: 0,
        offset,
    })
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn recv(&self) -> Result<ReceivedMessage, PipelineError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(item) => item,
            None => {
                self.drained.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn commit(&self, message: &ReceivedMessage) -> Result<(), PipelineError> {
        self.committed.lock().unwrap().push(message.offset);
        Ok(())
    }
}
