//! Interface definitions for the search index and the document store.
//!
//! Both dependencies sit behind traits so the sync core can be wired with
//! any backend, and tested against in-memory implementations.

mod document_store;
mod search_engine_client;

pub use document_store::DocumentStore;
pub use search_engine_client::SearchEngineClient;
