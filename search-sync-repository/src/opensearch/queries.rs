//! OpenSearch query builders.
//!
//! This module builds the search request body for a validated `SearchQuery`.

use serde_json::{json, Value};

use search_sync_shared::{SearchQuery, SearchScope};

/// Boost applied to title matches relative to content matches.
const TITLE_BOOST: f64 = 2.0;

/// Build an OpenSearch search body from a SearchQuery.
///
/// The body handles:
/// - scope selection: title, content, or either (`minimum_should_match: 1`)
/// - an exact author `term` filter applied on top of the text match
/// - pagination through `from` / `size`
/// - ordering by score, then by most recent `updated_at`
pub fn build_search_query(query: &SearchQuery) -> Value {
    let should = build_text_clauses(query.query(), query.scope());

    let mut bool_query = json!({
        "should": should,
        "minimum_should_match": 1
    });

    if let Some(author) = query.author() {
        bool_query["filter"] = json!([
            { "term": { "author": author } }
        ]);
    }

    json!({
        "query": {
            "bool": bool_query
        },
        "from": query.offset(),
        "size": query.limit(),
        "track_total_hits": true,
        "sort": [
            { "_score": { "order": "desc" } },
            { "updated_at": { "order": "desc" } }
        ]
    })
}

/// Build the `should` clauses for the requested scope.
fn build_text_clauses(text: &str, scope: SearchScope) -> Vec<Value> {
    let title = json!({
        "match": {
            "title": {
                "query": text,
                "boost": TITLE_BOOST
            }
        }
    });
    let content = json!({
        "match": {
            "content": text
        }
    });

    match scope {
        SearchScope::Title => vec![title],
        SearchScope::Content => vec![content],
        SearchScope::All => vec![title, content],
    }
}
