//! Dependency health reporting.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use search_sync_repository::{DocumentStore, SearchEngineClient};

/// Overall health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of probing the index and the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub search_ok: bool,
    pub store_ok: bool,
    /// Failure detail per dependency; empty when healthy.
    pub details: BTreeMap<String, String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Probes the search index and the document store.
pub struct HealthMonitor {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchEngineClient>,
}

impl HealthMonitor {
    pub fn new(store: Arc<dyn DocumentStore>, index: Arc<dyn SearchEngineClient>) -> Self {
        Self { store, index }
    }

    /// Probe both dependencies concurrently.
    ///
    /// The report is healthy only when both probes succeed.
    pub async fn check(&self) -> HealthReport {
        let (search, store) = tokio::join!(self.index.health_check(), self.store.health_check());

        let mut details = BTreeMap::new();

        let search_ok = match search {
            Ok(true) => true,
            Ok(false) => {
                details.insert("search_index".to_string(), "unhealthy status".to_string());
                false
            }
            Err(e) => {
                details.insert("search_index".to_string(), e.to_string());
                false
            }
        };

        let store_ok = match store {
            Ok(true) => true,
            Ok(false) => {
                details.insert("document_store".to_string(), "unhealthy status".to_string());
                false
            }
            Err(e) => {
                details.insert("document_store".to_string(), e.to_string());
                false
            }
        };

        let status = if search_ok && store_ok {
            HealthStatus::Healthy
        } else {
            warn!(details = ?details, "Health check failed");
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            timestamp: Utc::now(),
            search_ok,
            store_ok,
            details,
        }
    }
}
