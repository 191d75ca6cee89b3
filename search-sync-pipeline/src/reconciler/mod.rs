//! Reconciler.
//!
//! Walks every page of the document store and bulk-writes the projections to
//! the index. Runs once on a timer tick and on demand; it is the backstop for
//! any event the ingester missed or failed to apply.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::PipelineError;
use search_sync_repository::{DocumentStore, SearchEngineClient};
use search_sync_shared::IndexedDocument;

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Whether the periodic loop runs at all.
    pub enabled: bool,
    /// Time between the start of consecutive runs.
    pub interval: Duration,
    /// Documents requested per store page.
    pub batch_size: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5 * 60),
            batch_size: 100,
        }
    }
}

/// Summary of one completed full sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub pages_fetched: u32,
    pub documents_synced: u64,
    pub duration: Duration,
}

/// Reconciler configuration plus the result of the last successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub enabled: bool,
    pub interval_ms: u64,
    pub batch_size: u32,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_synced_count: u64,
}

#[derive(Debug, Default)]
struct SyncState {
    last_sync_time: Option<DateTime<Utc>>,
    last_synced_count: u64,
}

/// Periodically rebuilds the index from the document store.
pub struct Reconciler {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchEngineClient>,
    config: ReconcilerConfig,
    state: RwLock<SyncState>,
    // Serializes full syncs so a manual trigger never overlaps a tick.
    run_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn SearchEngineClient>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            index,
            config,
            state: RwLock::new(SyncState::default()),
            run_lock: Mutex::new(()),
        }
    }

    /// Copy every document in the store into the index.
    ///
    /// Pages are requested from 1 with the configured batch size. The walk
    /// ends on an empty page or a page shorter than the batch size. Any
    /// failure aborts the run; the next run starts again from page 1.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReport)` - Pages fetched, documents written and elapsed time
    /// * `Err(PipelineError)` - The first store or index error encountered
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn full_sync(&self) -> Result<SyncReport, PipelineError> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();

        info!("Starting full sync");

        let mut page = 1u32;
        let mut pages_fetched = 0u32;
        let mut documents_synced = 0u64;

        loop {
            let batch = self.store.get_page(page, self.config.batch_size).await?;
            pages_fetched += 1;

            if batch.is_empty() {
                debug!(page = page, "Empty page, full sync complete");
                break;
            }

            let is_last = batch.is_last_page();
            let documents: Vec<IndexedDocument> = batch
                .documents
                .into_iter()
                .map(IndexedDocument::from)
                .collect();

            self.index.bulk_upsert(&documents).await?;
            documents_synced += documents.len() as u64;

            info!(
                page = page,
                count = documents.len(),
                total = documents_synced,
                "Synced batch"
            );

            if is_last {
                break;
            }
            page += 1;
        }

        let report = SyncReport {
            pages_fetched,
            documents_synced,
            duration: started.elapsed(),
        };

        let mut state = self.state.write().await;
        state.last_sync_time = Some(Utc::now());
        state.last_synced_count = documents_synced;

        info!(
            pages = report.pages_fetched,
            documents = report.documents_synced,
            duration_ms = report.duration.as_millis() as u64,
            "Full sync completed"
        );

        Ok(report)
    }

    /// Run a full sync now and on every interval tick until shutdown.
    ///
    /// Returns immediately when periodic sync is disabled. A failed run is
    /// logged and the loop waits for the next tick. Shutdown abandons a run
    /// in progress.
    #[instrument(skip(self, shutdown))]
    pub async fn start_periodic(&self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            info!("Periodic sync is disabled");
            return;
        }
        if self.config.interval.is_zero() {
            warn!("Sync interval is zero, periodic sync not started");
            return;
        }

        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "Starting periodic sync"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Periodic sync received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = shutdown.recv() => {
                            warn!("Shutdown during full sync, abandoning run");
                            break;
                        }
                        result = self.full_sync() => {
                            if let Err(e) = result {
                                error!(error = %e, transient = e.is_transient(), "Periodic sync failed");
                            }
                        }
                    }
                }
            }
        }

        info!("Periodic sync stopped");
    }

    /// Current configuration and the outcome of the last successful run.
    pub async fn status(&self) -> SyncStatus {
        let state = self.state.read().await;
        SyncStatus {
            enabled: self.config.enabled,
            interval_ms: self.config.interval.as_millis() as u64,
            batch_size: self.config.batch_size,
            last_sync_time: state.last_sync_time,
            last_synced_count: state.last_synced_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{canonical, InMemoryIndex, InMemoryStore};
    use std::sync::atomic::Ordering;

    fn store_with(count: u32) -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with_documents(
            (1..=count).map(|id| canonical(id, &format!("Doc {}", id), "body")),
        ))
    }

    fn reconciler(
        store: &Arc<InMemoryStore>,
        index: &Arc<InMemoryIndex>,
        batch_size: u32,
    ) -> Reconciler {
        Reconciler::new(
            store.clone(),
            index.clone(),
            ReconcilerConfig {
                batch_size,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_full_sync_stops_on_short_page() {
        let store = store_with(25);
        let index = Arc::new(InMemoryIndex::default());

        let report = reconciler(&store, &index, 10).full_sync().await.unwrap();

        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.documents_synced, 25);
        assert_eq!(store.page_fetches.load(Ordering::SeqCst), 3);
        assert_eq!(index.len(), 25);
    }

    #[tokio::test]
    async fn test_full_sync_exact_multiple_fetches_trailing_empty_page() {
        let store = store_with(20);
        let index = Arc::new(InMemoryIndex::default());

        let report = reconciler(&store, &index, 10).full_sync().await.unwrap();

        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.documents_synced, 20);
        assert_eq!(index.bulk_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_full_sync_empty_store() {
        let store = store_with(0);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = reconciler(&store, &index, 10);

        let report = reconciler.full_sync().await.unwrap();

        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.documents_synced, 0);
        assert_eq!(index.bulk_calls.load(Ordering::SeqCst), 0);
        assert!(reconciler.status().await.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn test_full_sync_overwrites_stale_entries() {
        let store = store_with(3);
        let index = Arc::new(InMemoryIndex::default());
        index.seed(IndexedDocument::project(&canonical(2, "Stale", "old")));

        reconciler(&store, &index, 10).full_sync().await.unwrap();

        assert_eq!(index.get(2).unwrap().title, "Doc 2");
    }

    #[tokio::test]
    async fn test_full_sync_aborts_on_page_error() {
        let store = store_with(25);
        store.fail_from_page.store(2, Ordering::SeqCst);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = reconciler(&store, &index, 10);

        let err = reconciler.full_sync().await.unwrap_err();

        assert!(matches!(err, PipelineError::StoreError(_)));
        // The first page was written before the failure.
        assert_eq!(index.len(), 10);
        let status = reconciler.status().await;
        assert!(status.last_sync_time.is_none());
        assert_eq!(status.last_synced_count, 0);
    }

    #[tokio::test]
    async fn test_full_sync_aborts_on_bulk_error() {
        let store = store_with(5);
        let index = Arc::new(InMemoryIndex::default());
        index.fail_writes.store(true, Ordering::SeqCst);
        let reconciler = reconciler(&store, &index, 10);

        assert!(matches!(
            reconciler.full_sync().await,
            Err(PipelineError::SearchError(_))
        ));
        assert!(reconciler.status().await.last_sync_time.is_none());
    }

    #[tokio::test]
    async fn test_status_reports_last_run() {
        let store = store_with(4);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = reconciler(&store, &index, 10);

        let before = reconciler.status().await;
        assert!(before.enabled);
        assert_eq!(before.interval_ms, 300_000);
        assert_eq!(before.batch_size, 10);
        assert!(before.last_sync_time.is_none());

        reconciler.full_sync().await.unwrap();

        let after = reconciler.status().await;
        assert!(after.last_sync_time.is_some());
        assert_eq!(after.last_synced_count, 4);

        let json = serde_json::to_value(&after).unwrap();
        assert_eq!(json["last_synced_count"], 4);
        assert_eq!(json["interval_ms"], 300_000);
    }

    #[tokio::test]
    async fn test_status_keeps_sub_second_interval() {
        let store = store_with(0);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = Reconciler::new(
            store,
            index,
            ReconcilerConfig {
                interval: Duration::from_millis(500),
                ..Default::default()
            },
        );

        assert_eq!(reconciler.status().await.interval_ms, 500);
    }

    #[tokio::test]
    async fn test_full_sync_leaves_entry_deleted_upstream() {
        let store = store_with(5);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = reconciler(&store, &index, 10);
        reconciler.full_sync().await.unwrap();

        store.remove(3);
        let report = reconciler.full_sync().await.unwrap();

        // Absent ids are not pruned; only a delete signal removes them.
        assert_eq!(report.documents_synced, 4);
        assert_eq!(index.len(), 5);
        assert_eq!(index.removes.load(Ordering::SeqCst), 0);
        assert_eq!(reconciler.status().await.last_synced_count, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_runs_immediately_and_on_each_tick() {
        let store = store_with(5);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            index.clone(),
            ReconcilerConfig {
                enabled: true,
                interval: Duration::from_secs(60),
                batch_size: 10,
            },
        ));

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn({
            let reconciler = reconciler.clone();
            async move { reconciler.start_periodic(rx).await }
        });

        // First tick fires at once, then at 60s and 120s.
        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(store.page_fetches.load(Ordering::SeqCst), 3);
        assert_eq!(index.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_survives_failed_run() {
        let store = store_with(5);
        store.fail_transport.store(true, Ordering::SeqCst);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            index.clone(),
            ReconcilerConfig {
                enabled: true,
                interval: Duration::from_secs(60),
                batch_size: 10,
            },
        ));

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn({
            let reconciler = reconciler.clone();
            async move { reconciler.start_periodic(rx).await }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(index.len(), 0);

        store.fail_transport.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(index.len(), 5);
        assert_eq!(reconciler.status().await.last_synced_count, 5);
    }

    #[tokio::test]
    async fn test_periodic_disabled_returns_immediately() {
        let store = store_with(5);
        let index = Arc::new(InMemoryIndex::default());
        let reconciler = Reconciler::new(
            store.clone(),
            index.clone(),
            ReconcilerConfig {
                enabled: false,
                ..Default::default()
            },
        );

        let (_tx, rx) = broadcast::channel(1);
        reconciler.start_periodic(rx).await;

        assert_eq!(store.page_fetches.load(Ordering::SeqCst), 0);
        assert!(!reconciler.status().await.enabled);
    }
}
