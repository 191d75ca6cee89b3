//! HTTP implementation of the document store gateway.

mod client;

pub use client::{DocumentStoreConfig, HttpDocumentStore};
