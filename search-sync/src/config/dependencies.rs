//! Dependency initialization and wiring for the search sync service.

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::ServiceError;
use search_sync_pipeline::{
    consumer::KafkaConsumer,
    health::HealthMonitor,
    ingester::{EventIngester, IngesterConfig},
    orchestrator::{Orchestrator, OrchestratorConfig},
    processor::SyncEngine,
    query::SearchService,
    reconciler::{Reconciler, ReconcilerConfig},
};
use search_sync_repository::{
    ConnectionOptions, DocumentStore, DocumentStoreConfig, HttpDocumentStore, IndexConfig,
    OpenSearchClient, SearchEngineClient,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// Single-document sync, for callers outside the event path.
    pub sync_engine: Arc<SyncEngine>,
    /// Read-only search over the index.
    pub search: SearchService,
    /// Probes for the index and the store.
    pub health: HealthMonitor,
}

impl Dependencies {
    /// Build every component from `settings`.
    ///
    /// Fails if the index or the store is unreachable, or if the Kafka
    /// consumer cannot be created and subscribed.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If initialization fails
    pub async fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            opensearch_url = %settings.opensearch.url,
            index = %settings.opensearch.index,
            doc_service_url = %settings.doc_service.url,
            kafka_broker = %settings.kafka.broker,
            kafka_topic = %settings.kafka.topic,
            kafka_group_id = %settings.kafka.group_id,
            "Initializing dependencies"
        );

        // Initialize OpenSearch client
        let search_client = OpenSearchClient::with_options(
            &settings.opensearch.url,
            IndexConfig::new(settings.opensearch.index.clone()),
            ConnectionOptions {
                credentials: settings.opensearch.credentials.clone(),
                timeout: Some(settings.opensearch.timeout),
            },
        )
        .await
        .map_err(|e| ServiceError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| ServiceError::startup(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(ServiceError::startup("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        // Initialize document store client
        let mut store_config = DocumentStoreConfig::new(settings.doc_service.url.clone())
            .with_timeout(settings.doc_service.timeout);
        if let Some(api_key) = &settings.doc_service.api_key {
            store_config = store_config.with_api_key(api_key.clone());
        }

        let store = HttpDocumentStore::new(store_config).map_err(|e| {
            ServiceError::config(format!("Failed to create document store client: {}", e))
        })?;

        let healthy = store.health_check().await.map_err(|e| {
            ServiceError::startup(format!("Document store health check failed: {}", e))
        })?;

        if !healthy {
            return Err(ServiceError::startup("Document store is unhealthy"));
        }

        info!("Document store connection verified");

        // Initialize Kafka consumer
        let consumer = KafkaConsumer::new(
            &settings.kafka.broker,
            &settings.kafka.group_id,
            &settings.kafka.topic,
        )
        .map_err(|e| ServiceError::startup(format!("Failed to create Kafka consumer: {}", e)))?;

        consumer
            .subscribe()
            .map_err(|e| ServiceError::startup(format!("Failed to subscribe: {}", e)))?;

        info!("Kafka consumer created");

        let index: Arc<dyn SearchEngineClient> = Arc::new(search_client);
        let store: Arc<dyn DocumentStore> = Arc::new(store);

        let sync_engine = Arc::new(SyncEngine::new(store.clone(), index.clone()));

        let ingester = Arc::new(EventIngester::with_config(
            Arc::new(consumer),
            sync_engine.clone(),
            IngesterConfig {
                read_error_backoff: settings.kafka.retry_backoff,
            },
        ));

        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            index.clone(),
            ReconcilerConfig {
                enabled: settings.sync.enabled,
                interval: settings.sync.interval,
                batch_size: settings.sync.batch_size,
            },
        ));

        let orchestrator = Orchestrator::with_config(
            ingester,
            reconciler,
            index.clone(),
            OrchestratorConfig {
                shutdown_timeout: settings.shutdown_timeout,
            },
        );

        Ok(Self {
            orchestrator,
            sync_engine,
            search: SearchService::new(index.clone()),
            health: HealthMonitor::new(store, index),
        })
    }
}
