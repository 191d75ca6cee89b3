//! Request and response types for gateway operations.

use search_sync_shared::CanonicalDocument;

/// One page of documents read from the document store.
#[derive(Debug, Clone, Default)]
pub struct DocumentPage {
    /// Documents on this page, in store order.
    pub documents: Vec<CanonicalDocument>,
    /// 1-indexed page number that was requested.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total document count reported by the store, if any.
    pub total: Option<u64>,
}

impl DocumentPage {
    /// True iff this page holds fewer documents than the requested page size.
    pub fn is_last_page(&self) -> bool {
        self.documents.len() < self.page_size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
