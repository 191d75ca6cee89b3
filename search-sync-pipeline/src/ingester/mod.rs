//! Event ingester.
//!
//! Reads change events from a `MessageSource` and dispatches each one to the
//! `SyncEngine`. A bad event is logged and skipped; it never stops the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{ChangeEvent, ChangeKind, EventDecodeError, MessageSource};
use crate::errors::PipelineError;
use crate::processor::{SyncEngine, SyncOutcome};
use search_sync_shared::DocumentId;

/// Pause after a failed read from the event bus.
pub const DEFAULT_READ_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Configuration for the ingester.
#[derive(Debug, Clone)]
pub struct IngesterConfig {
    pub read_error_backoff: Duration,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            read_error_backoff: DEFAULT_READ_ERROR_BACKOFF,
        }
    }
}

/// What handling a single event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A created/updated event wrote the current store version to the index.
    Indexed(DocumentId),
    /// A created/updated event found the document gone and removed it.
    Removed(DocumentId),
    /// A deleted event removed the document.
    Deleted(DocumentId),
    /// The payload could not be decoded.
    Skipped(EventDecodeError),
    /// The sync or delete failed; the reconciler will repair the entry.
    Failed { document_id: DocumentId, error: String },
}

/// Counters for events seen since startup.
#[derive(Debug, Default)]
struct IngesterCounters {
    handled: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    read_errors: AtomicU64,
}

/// Snapshot of the ingester counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngesterStats {
    pub handled: u64,
    pub skipped: u64,
    pub failed: u64,
    pub read_errors: u64,
}

/// Consumes change events and applies them to the index.
pub struct EventIngester {
    source: Arc<dyn MessageSource>,
    engine: Arc<SyncEngine>,
    config: IngesterConfig,
    counters: IngesterCounters,
}

impl EventIngester {
    /// Create a new ingester with the default configuration.
    pub fn new(source: Arc<dyn MessageSource>, engine: Arc<SyncEngine>) -> Self {
        Self::with_config(source, engine, IngesterConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn MessageSource>,
        engine: Arc<SyncEngine>,
        config: IngesterConfig,
    ) -> Self {
        Self {
            source,
            engine,
            config,
            counters: IngesterCounters::default(),
        }
    }

    pub fn stats(&self) -> IngesterStats {
        IngesterStats {
            handled: self.counters.handled.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            read_errors: self.counters.read_errors.load(Ordering::Relaxed),
        }
    }

    /// Decode one payload and dispatch it.
    ///
    /// Never returns an error: failures are logged and reported in the
    /// outcome so the caller can keep consuming.
    pub async fn handle_payload(&self, payload: &[u8]) -> EventOutcome {
        let event = match ChangeEvent::decode(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable change event");
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                return EventOutcome::Skipped(e);
            }
        };

        let id = event.document_id;
        debug!(document_id = id, kind = %event.kind, "Handling change event");

        let result = match event.kind {
            ChangeKind::Created | ChangeKind::Updated => {
                self.engine
                    .sync_document(id)
                    .await
                    .map(|outcome| match outcome {
                        SyncOutcome::Indexed => EventOutcome::Indexed(id),
                        SyncOutcome::Removed => EventOutcome::Removed(id),
                    })
            }
            ChangeKind::Deleted => self
                .engine
                .delete_document(id)
                .await
                .map(|_| EventOutcome::Deleted(id)),
        };

        match result {
            Ok(outcome) => {
                info!(document_id = id, kind = %event.kind, outcome = ?outcome, "Applied change event");
                self.counters.handled.fetch_add(1, Ordering::Relaxed);
                outcome
            }
            Err(e) => {
                error!(
                    document_id = id,
                    kind = %event.kind,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to apply change event"
                );
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                EventOutcome::Failed {
                    document_id: id,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Consume events until a shutdown signal is received.
    ///
    /// Each message is committed after it has been dispatched, whatever the
    /// outcome, so a poison event cannot block the partition. A read error
    /// pauses the loop for the configured backoff.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), PipelineError> {
        info!("Event ingester started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Ingester received shutdown signal");
                    break;
                }
                received = self.source.recv() => {
                    match received {
                        Ok(message) => {
                            match message.payload.as_deref() {
                                Some(payload) => {
                                    self.handle_payload(payload).await;
                                }
                                None => {
                                    debug!(offset = message.offset, "Received message with empty payload");
                                    self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                                }
                            }

                            if let Err(e) = self.source.commit(&message).await {
                                warn!(
                                    partition = message.partition,
                                    offset = message.offset,
                                    error = %e,
                                    "Failed to commit offset"
                                );
                            }
                        }
                        Err(e) => {
                            self.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                            error!(
                                error = %e,
                                backoff_ms = self.config.read_error_backoff.as_millis() as u64,
                                "Failed to read from event bus, backing off"
                            );

                            tokio::select! {
                                _ = shutdown.recv() => {
                                    info!("Ingester received shutdown signal during backoff");
                                    break;
                                }
                                _ = tokio::time::sleep(self.config.read_error_backoff) => {}
                            }
                        }
                    }
                }
            }
        }

        info!(stats = ?self.stats(), "Event ingester stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{canonical, message, InMemoryIndex, InMemoryStore, ScriptedSource};
    use search_sync_shared::IndexedDocument;

    struct Fixture {
        store: Arc<InMemoryStore>,
        index: Arc<InMemoryIndex>,
        source: Arc<ScriptedSource>,
        ingester: Arc<EventIngester>,
    }

    fn fixture(script: Vec<Result<crate::consumer::ReceivedMessage, PipelineError>>) -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        let index = Arc::new(InMemoryIndex::default());
        let source = Arc::new(ScriptedSource::new(script));
        let engine = Arc::new(SyncEngine::new(store.clone(), index.clone()));
        let ingester = Arc::new(EventIngester::new(source.clone(), engine));
        Fixture {
            store,
            index,
            source,
            ingester,
        }
    }

    #[tokio::test]
    async fn test_created_event_indexes_store_version() {
        let f = fixture(vec![]);
        let doc = canonical(5, "From store", "store body");
        f.store.insert(doc.clone());

        // The payload title differs from the store; the store wins.
        let outcome = f
            .ingester
            .handle_payload(br#"{"event":"created","id":"5","title":"From event"}"#)
            .await;

        assert_eq!(outcome, EventOutcome::Indexed(5));
        assert_eq!(f.index.get(5), Some(IndexedDocument::project(&doc)));
    }

    #[tokio::test]
    async fn test_updated_event_for_missing_document_removes_it() {
        let f = fixture(vec![]);
        f.index
            .seed(IndexedDocument::project(&canonical(7, "Gone", "gone")));

        let outcome = f
            .ingester
            .handle_payload(br#"{"event":"updated","id":"7"}"#)
            .await;

        assert_eq!(outcome, EventOutcome::Removed(7));
        assert!(f.index.get(7).is_none());
    }

    #[tokio::test]
    async fn test_deleted_event_removes_document() {
        let f = fixture(vec![]);
        f.index.seed(IndexedDocument::project(&canonical(2, "A", "a")));

        let outcome = f
            .ingester
            .handle_payload(br#"{"event":"deleted","id":"2"}"#)
            .await;

        assert_eq!(outcome, EventOutcome::Deleted(2));
        assert!(f.index.get(2).is_none());
    }

    #[tokio::test]
    async fn test_unknown_kind_is_skipped() {
        let f = fixture(vec![]);
        let outcome = f
            .ingester
            .handle_payload(br#"{"event":"archived","id":"9"}"#)
            .await;

        assert!(matches!(
            outcome,
            EventOutcome::Skipped(EventDecodeError::UnknownKind { .. })
        ));
        assert_eq!(f.ingester.stats().skipped, 1);
        assert_eq!(f.index.removes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_reports_failed() {
        let f = fixture(vec![]);
        f.store.insert(canonical(4, "A", "a"));
        f.store.fail_transport.store(true, Ordering::SeqCst);

        let outcome = f
            .ingester
            .handle_payload(br#"{"event":"updated","id":"4"}"#)
            .await;

        assert!(matches!(outcome, EventOutcome::Failed { document_id: 4, .. }));
        assert!(f.index.get(4).is_none());
        assert_eq!(f.ingester.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_malformed_event_does_not_stop_loop() {
        let f = fixture(vec![
            message(0, "garbage"),
            message(1, r#"{"event":"created","id":"1"}"#),
            Ok(crate::consumer::ReceivedMessage {
                payload: None,
                topic: "document-events".to_string(),
                partition: 0,
                offset: 2,
            }),
            message(3, r#"{"event":"created","id":"3"}"#),
        ]);
        f.store.insert(canonical(1, "One", "first"));
        f.store.insert(canonical(3, "Three", "third"));

        let (tx, rx) = broadcast::channel(1);
        let ingester = f.ingester.clone();
        let handle = tokio::spawn(async move { ingester.run(rx).await });

        f.source.wait_drained().await;
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert!(f.index.get(1).is_some());
        assert!(f.index.get(3).is_some());
        assert_eq!(*f.source.committed.lock().unwrap(), vec![0, 1, 2, 3]);

        let stats = f.ingester.stats();
        assert_eq!(stats.handled, 2);
        assert_eq!(stats.skipped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_backs_off_then_resumes() {
        let f = fixture(vec![
            Err(PipelineError::kafka("broker transport failure")),
            message(0, r#"{"event":"created","id":"1"}"#),
        ]);
        f.store.insert(canonical(1, "One", "first"));

        let started = tokio::time::Instant::now();
        let (tx, rx) = broadcast::channel(1);
        let ingester = f.ingester.clone();
        let handle = tokio::spawn(async move { ingester.run(rx).await });

        f.source.wait_drained().await;
        assert!(started.elapsed() >= DEFAULT_READ_ERROR_BACKOFF);

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert!(f.index.get(1).is_some());
        assert_eq!(f.ingester.stats().read_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_backoff() {
        let f = fixture(vec![Err(PipelineError::kafka("broker down"))]);

        let (tx, rx) = broadcast::channel(1);
        let ingester = f.ingester.clone();
        let handle = tokio::spawn(async move { ingester.run(rx).await });

        // Let the loop hit the read error and enter its backoff.
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(f.source.reads.load(Ordering::SeqCst), 1);
    }
}
