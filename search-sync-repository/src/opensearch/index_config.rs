//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the document search index.

use serde_json::{json, Value};

/// Default name of the search index.
pub const DEFAULT_INDEX_NAME: &str = "documents";

/// Default upper bound on documents sent in one bulk request.
const DEFAULT_MAX_BULK_SIZE: usize = 1000;

/// Configuration of the index the client writes to.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Index name.
    pub name: String,
    /// Request a refresh on every write so the change is immediately searchable.
    pub refresh_on_write: bool,
    /// Maximum number of documents per bulk request; larger inputs are split.
    pub max_bulk_size: usize,
}

impl IndexConfig {
    /// Create a config for the named index with default write behavior.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set whether writes request an index refresh.
    pub fn with_refresh_on_write(mut self, refresh: bool) -> Self {
        self.refresh_on_write = refresh;
        self
    }

    /// Set the bulk request size limit. Zero is treated as one.
    pub fn with_max_bulk_size(mut self, max_bulk_size: usize) -> Self {
        self.max_bulk_size = max_bulk_size.max(1);
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
            refresh_on_write: true,
            max_bulk_size: DEFAULT_MAX_BULK_SIZE,
        }
    }
}

/// Get the index settings and mappings for the document search index.
///
/// - `title` and `content` are analyzed with the standard analyzer
/// - `title.keyword` keeps the exact title for sorting and exact matches
/// - `author` is an exact-match keyword used by the author filter
pub fn get_index_settings() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": {
                    "type": "integer"
                },
                "title": {
                    "type": "text",
                    "analyzer": "standard",
                    "fields": {
                        "keyword": {
                            "type": "keyword"
                        }
                    }
                },
                "content": {
                    "type": "text",
                    "analyzer": "standard"
                },
                "author": {
                    "type": "keyword"
                },
                "created_at": {
                    "type": "date"
                },
                "updated_at": {
                    "type": "date"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();
        let properties = &settings["mappings"]["properties"];

        assert_eq!(properties["id"]["type"], "integer");
        assert_eq!(properties["title"]["type"], "text");
        assert_eq!(properties["title"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(properties["content"]["type"], "text");
        assert_eq!(properties["author"]["type"], "keyword");
        assert_eq!(properties["created_at"]["type"], "date");
        assert_eq!(properties["updated_at"]["type"], "date");
    }

    #[test]
    fn test_index_config_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.name, DEFAULT_INDEX_NAME);
        assert!(config.refresh_on_write);
        assert_eq!(config.max_bulk_size, 1000);

        let config = IndexConfig::new("wiki").with_max_bulk_size(0);
        assert_eq!(config.name, "wiki");
        assert_eq!(config.max_bulk_size, 1);
    }
}
