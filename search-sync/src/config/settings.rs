//! Environment-driven settings.
//!
//! Every variable has a default except `KAFKA_BROKER`. Durations use
//! humantime syntax (`30s`, `5m`). A value that is set but malformed is an
//! error rather than a silent fallback to the default.

use std::env;
use std::time::Duration;

use crate::ServiceError;

const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";
const DEFAULT_OPENSEARCH_INDEX: &str = "documents";
const DEFAULT_DOC_SERVICE_URL: &str = "http://localhost:8081";
const DEFAULT_KAFKA_TOPIC: &str = "document-events";
const DEFAULT_KAFKA_GROUP_ID: &str = "search-service-group";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_KAFKA_RETRY_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_SYNC_BATCH_SIZE: u32 = 100;
const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSearchSettings {
    pub url: String,
    pub credentials: Option<(String, String)>,
    pub index: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocServiceSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    pub broker: String,
    pub topic: String,
    pub group_id: String,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub batch_size: u32,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub opensearch: OpenSearchSettings,
    pub doc_service: DocServiceSettings,
    pub kafka: KafkaSettings,
    pub sync: SyncSettings,
    pub shutdown_timeout: Duration,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: basic auth, both or neither
    /// - `OPENSEARCH_INDEX`: index name (default: documents)
    /// - `OPENSEARCH_TIMEOUT`: per-request timeout (default: 30s)
    /// - `DOC_SERVICE_URL`: document service base URL (default: http://localhost:8081)
    /// - `DOC_SERVICE_API_KEY`: bearer token for the document service
    /// - `DOC_SERVICE_TIMEOUT`: per-request timeout (default: 30s)
    /// - `KAFKA_BROKER`: Kafka broker address (required)
    /// - `KAFKA_TOPIC`: change event topic (default: document-events)
    /// - `KAFKA_GROUP_ID`: consumer group ID (default: search-service-group)
    /// - `KAFKA_RETRY_BACKOFF`: pause after a failed read (default: 5s)
    /// - `SYNC_BATCH_SIZE`: reconciler page size (default: 100)
    /// - `SYNC_INTERVAL`: reconciler period (default: 5m)
    /// - `ENABLE_SYNC`: run the periodic reconciler (default: true)
    /// - `SHUTDOWN_TIMEOUT`: wait for background tasks on shutdown (default: 30s)
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = match (get("OPENSEARCH_USERNAME"), get("OPENSEARCH_PASSWORD")) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (None, None) => None,
            _ => {
                return Err(ServiceError::config(
                    "OPENSEARCH_USERNAME and OPENSEARCH_PASSWORD must be set together",
                ))
            }
        };

        let opensearch = OpenSearchSettings {
            url: get("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            credentials,
            index: get("OPENSEARCH_INDEX").unwrap_or_else(|| DEFAULT_OPENSEARCH_INDEX.to_string()),
            timeout: duration_var(&get, "OPENSEARCH_TIMEOUT", DEFAULT_REQUEST_TIMEOUT)?,
        };

        let doc_service = DocServiceSettings {
            url: get("DOC_SERVICE_URL").unwrap_or_else(|| DEFAULT_DOC_SERVICE_URL.to_string()),
            api_key: get("DOC_SERVICE_API_KEY"),
            timeout: duration_var(&get, "DOC_SERVICE_TIMEOUT", DEFAULT_REQUEST_TIMEOUT)?,
        };

        let kafka = KafkaSettings {
            broker: get("KAFKA_BROKER")
                .ok_or_else(|| ServiceError::config("KAFKA_BROKER must be set"))?,
            topic: get("KAFKA_TOPIC").unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            group_id: get("KAFKA_GROUP_ID").unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.to_string()),
            retry_backoff: duration_var(&get, "KAFKA_RETRY_BACKOFF", DEFAULT_KAFKA_RETRY_BACKOFF)?,
        };

        let batch_size = match get("SYNC_BATCH_SIZE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ServiceError::config(format!(
                        "SYNC_BATCH_SIZE must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
            None => DEFAULT_SYNC_BATCH_SIZE,
        };

        let sync = SyncSettings {
            enabled: bool_var(&get, "ENABLE_SYNC", true)?,
            interval: duration_var(&get, "SYNC_INTERVAL", DEFAULT_SYNC_INTERVAL)?,
            batch_size,
        };

        if sync.enabled && sync.interval.is_zero() {
            return Err(ServiceError::config("SYNC_INTERVAL must be greater than zero"));
        }

        Ok(Self {
            opensearch,
            doc_service,
            kafka,
            sync,
            shutdown_timeout: duration_var(&get, "SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT)?,
        })
    }
}

fn duration_var<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ServiceError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => humantime::parse_duration(raw.trim())
            .map_err(|e| ServiceError::config(format!("{} is not a valid duration: {}", key, e))),
        None => Ok(default),
    }
}

fn bool_var<G>(get: &G, key: &str, default: bool) -> Result<bool, ServiceError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "yes" => Ok(true),
            "0" | "f" | "false" | "no" => Ok(false),
            other => Err(ServiceError::config(format!(
                "{} must be a boolean, got '{}'",
                key, other
            ))),
        },
        None => Ok(default),
    }
}
