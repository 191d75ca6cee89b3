//! Orchestrator module for the search sync pipeline.
//!
//! Runs the event ingester and the periodic reconciler side by side and
//! stops both on shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::errors::PipelineError;
use crate::ingester::EventIngester;
use crate::reconciler::Reconciler;
use search_sync_repository::SearchEngineClient;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How long to wait for background tasks after shutdown is signalled.
    pub shutdown_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Orchestrator that coordinates the pipeline components.
///
/// The orchestrator:
/// - Makes sure the search index exists before anything writes to it
/// - Starts the ingester and the periodic reconciler as background tasks
/// - Broadcasts shutdown and waits, bounded, for both to stop
pub struct Orchestrator {
    ingester: Arc<EventIngester>,
    reconciler: Arc<Reconciler>,
    index: Arc<dyn SearchEngineClient>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        ingester: Arc<EventIngester>,
        reconciler: Arc<Reconciler>,
        index: Arc<dyn SearchEngineClient>,
    ) -> Self {
        Self::with_config(ingester, reconciler, index, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        ingester: Arc<EventIngester>,
        reconciler: Arc<Reconciler>,
        index: Arc<dyn SearchEngineClient>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            ingester,
            reconciler,
            index,
            config,
            shutdown_tx,
        }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Run until SIGINT or SIGTERM.
    pub async fn run(&self) -> Result<(), PipelineError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` resolves or [`Orchestrator::shutdown`] is called.
    #[instrument(skip(self, signal))]
    pub async fn run_until<F>(&self, signal: F) -> Result<(), PipelineError>
    where
        F: Future<Output = ()> + Send,
    {
        info!("Starting search sync orchestrator");

        self.index.ensure_index_exists().await?;

        let mut stop_rx = self.shutdown_tx.subscribe();

        let ingester = self.ingester.clone();
        let ingester_rx = self.shutdown_tx.subscribe();
        let ingester_handle: JoinHandle<()> = tokio::spawn(async move {
            if let Err(e) = ingester.run(ingester_rx).await {
                error!(error = %e, "Ingester error");
            }
        });

        let reconciler = self.reconciler.clone();
        let reconciler_rx = self.shutdown_tx.subscribe();
        let reconciler_handle: JoinHandle<()> = tokio::spawn(async move {
            reconciler.start_periodic(reconciler_rx).await;
        });

        tokio::select! {
            _ = signal => {
                info!("Received shutdown signal");
            }
            _ = stop_rx.recv() => {
                info!("Shutdown requested");
            }
        }

        let _ = self.shutdown_tx.send(());

        let handles = vec![ingester_handle, reconciler_handle];
        match tokio::time::timeout(self.config.shutdown_timeout, join_all(handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        error!(error = %e, "Background task panicked");
                    }
                }
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.config.shutdown_timeout.as_secs(),
                    "Background tasks did not stop before the shutdown timeout"
                );
            }
        }

        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
