//! Processor module for the search sync pipeline.
//!
//! Brings the index entry for a single document in line with the store.

mod sync_engine;

pub use sync_engine::{SyncEngine, SyncOutcome};
