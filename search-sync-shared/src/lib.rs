//! # Search Sync Shared
//!
//! Plain data types shared by the document search sync crates: the
//! canonical document owned by the document store, its indexable
//! projection, and the search query/response shapes.

mod document;
mod search;

pub use document::{CanonicalDocument, DocumentId, IndexedDocument};
pub use search::{
    QueryError, SearchQuery, SearchRequest, SearchResponse, SearchScope, DEFAULT_LIMIT, MAX_LIMIT,
};
