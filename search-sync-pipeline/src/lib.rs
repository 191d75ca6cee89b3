//! # Search Sync Pipeline
//!
//! This crate keeps the search index consistent with the document store.
//!
//! ## Architecture
//!
//! Two independent paths converge on the same index:
//!
//! 1. **Ingester**: consumes change events from Kafka and dispatches each one
//!    to the sync engine (low latency, best effort)
//! 2. **Reconciler**: periodically walks every page of the document store and
//!    rewrites the index from it (correctness backstop)
//!
//! Both write through the **SyncEngine** / `SearchEngineClient`, whose writes
//! are full-document upserts and idempotent deletes, so concurrent writes for
//! the same id need no coordination. The **Orchestrator** runs both loops and
//! stops them on shutdown.

pub mod consumer;
pub mod errors;
pub mod health;
pub mod ingester;
pub mod orchestrator;
pub mod processor;
pub mod query;
pub mod reconciler;

#[cfg(test)]
mod test_support;

pub use errors::PipelineError;
