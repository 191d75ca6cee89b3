//! Search query and response types.
//!
//! `SearchRequest` carries raw caller input. It is normalized into a
//! `SearchQuery` before anything is sent to the index, so an invalid
//! request can never reach the search backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::IndexedDocument;

/// Result count used when the caller gives none or a non-positive limit.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest page of results a single query may request.
pub const MAX_LIMIT: usize = 100;

/// Errors produced while normalizing a search request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query text is empty or whitespace.
    #[error("search query is required")]
    EmptyQuery,

    /// The requested scope is not one of `title`, `content` or `all`.
    #[error("invalid search type '{0}', expected one of: title, content, all")]
    InvalidScope(String),
}

/// Which document fields a query matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Match titles only.
    Title,
    /// Match content only.
    Content,
    /// Match either titles or content; title hits rank higher.
    #[default]
    All,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Title => "title",
            SearchScope::Content => "content",
            SearchScope::All => "all",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(SearchScope::All),
            "title" => Ok(SearchScope::Title),
            "content" => Ok(SearchScope::Content),
            other => Err(QueryError::InvalidScope(other.to_string())),
        }
    }
}

/// Raw search parameters as supplied by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text (required).
    pub query: String,
    /// Search type: `title`, `content` or `all`.
    #[serde(default, rename = "type")]
    pub scope: Option<String>,
    /// Requested number of results.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Number of results to skip.
    #[serde(default)]
    pub offset: Option<i64>,
    /// Exact author filter.
    #[serde(default)]
    pub author: Option<String>,
}

impl SearchRequest {
    /// Create a request for the given query text with default parameters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Validate and normalize this request.
    ///
    /// - an empty query is rejected
    /// - limit defaults to 10 when absent or non-positive and is capped at 100
    /// - offset is clamped to zero
    /// - an empty author is treated as no filter
    pub fn into_query(self) -> Result<SearchQuery, QueryError> {
        if self.query.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let scope = match self.scope.as_deref() {
            Some(s) => s.parse()?,
            None => SearchScope::All,
        };

        Ok(SearchQuery {
            query: self.query,
            scope,
            limit: clamp_limit(self.limit),
            offset: clamp_offset(self.offset),
            author: self.author.filter(|a| !a.trim().is_empty()),
        })
    }
}

fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(l) if l > MAX_LIMIT as i64 => MAX_LIMIT,
        Some(l) if l > 0 => l as usize,
        _ => DEFAULT_LIMIT,
    }
}

fn clamp_offset(offset: Option<i64>) -> usize {
    match offset {
        Some(o) if o > 0 => o as usize,
        _ => 0,
    }
}

/// A validated search query, ready to be sent to the index.
///
/// Only constructible through [`SearchRequest::into_query`] or
/// [`SearchQuery::new`], both of which reject empty query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    query: String,
    scope: SearchScope,
    limit: usize,
    offset: usize,
    author: Option<String>,
}

impl SearchQuery {
    /// Build a query over all fields with default pagination.
    pub fn new(query: impl Into<String>) -> Result<Self, QueryError> {
        SearchRequest::new(query).into_query()
    }

    /// Restrict the query to the given scope.
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the author filter.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.author = if author.trim().is_empty() {
            None
        } else {
            Some(author)
        };
        self
    }

    /// Set pagination, applying the same clamping as request normalization.
    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = clamp_limit(Some(limit));
        self.offset = clamp_offset(Some(offset));
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

/// Ranked search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching documents ordered by relevance, most recently updated first on ties.
    pub documents: Vec<IndexedDocument>,
    /// Total number of matches, ignoring pagination.
    pub total: u64,
    /// Time the index spent executing the query, in milliseconds.
    pub took_ms: u64,
    /// The query text, echoed back.
    pub query: String,
}

impl SearchResponse {
    /// An empty response for the given query.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}
