//! Service settings read from the environment.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use catalog_search_repository::config::{
    DEFAULT_BACKEND_TIMEOUT, DEFAULT_EXPORT_BATCH_SIZE, DEFAULT_MAX_PAGE_SIZE,
};
use catalog_search_repository::{ExecutorConfig, SearchConfig};

use crate::ServiceError;

/// Default HTTP listen address.
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default index holding the catalog documents.
const DEFAULT_CATALOG_INDEX: &str = "cznet";

/// Default field listed by `/clusters`.
const DEFAULT_CLUSTERS_FIELD: &str = "clusters";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ServiceError::config(format!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Settings for the catalog search service.
///
/// Built once in `main` and handed to the dependency wiring by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub opensearch_url: String,
    pub index: String,
    pub clusters_field: String,
    pub backend_timeout: Duration,
    pub max_page_size: u64,
    pub export_batch_size: usize,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BIND_ADDRESS`: HTTP listen address (default: 0.0.0.0:8080)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `CATALOG_INDEX`: Index holding catalog documents (default: cznet)
    /// - `CLUSTERS_FIELD`: Field listed by `/clusters` (default: clusters)
    /// - `BACKEND_TIMEOUT_MS`: Per-call store timeout (default: 10000)
    /// - `MAX_PAGE_SIZE`: Largest accepted `pageSize` (default: 1000)
    /// - `EXPORT_BATCH_SIZE`: Scroll batch size for `/csv` (default: 1000)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - Parsed settings
    /// * `Err(ServiceError)` - If a variable holds an invalid value
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_address = text("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)
            .parse::<SocketAddr>()
            .map_err(|e| ServiceError::config(format!("BIND_ADDRESS is invalid: {}", e)))?;

        let backend_timeout_ms = parse_positive(
            "BACKEND_TIMEOUT_MS",
            lookup("BACKEND_TIMEOUT_MS"),
            DEFAULT_BACKEND_TIMEOUT.as_millis() as u64,
        )?;
        let max_page_size =
            parse_positive("MAX_PAGE_SIZE", lookup("MAX_PAGE_SIZE"), DEFAULT_MAX_PAGE_SIZE)?;
        let export_batch_size = parse_positive(
            "EXPORT_BATCH_SIZE",
            lookup("EXPORT_BATCH_SIZE"),
            DEFAULT_EXPORT_BATCH_SIZE as u64,
        )?;

        Ok(Self {
            bind_address,
            opensearch_url: text("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            index: text("CATALOG_INDEX", DEFAULT_CATALOG_INDEX),
            clusters_field: text("CLUSTERS_FIELD", DEFAULT_CLUSTERS_FIELD),
            backend_timeout: Duration::from_millis(backend_timeout_ms),
            max_page_size,
            export_batch_size: usize::try_from(export_batch_size)
                .map_err(|e| ServiceError::config(format!("EXPORT_BATCH_SIZE is invalid: {}", e)))?,
            log_format: lookup("LOG_FORMAT")
                .map(|value| value.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// Request validation settings for the search client.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::with_max_page_size(self.max_page_size)
    }

    /// Store settings for the executor.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::new(self.index.clone())
            .with_timeout(self.backend_timeout)
            .with_export_batch_size(self.export_batch_size)
    }
}

fn parse_positive(key: &str, value: Option<String>, default: u64) -> Result<u64, ServiceError> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(default);
    };

    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        Ok(_) => Err(ServiceError::config(format!("{} must be at least 1", key))),
        Err(e) => Err(ServiceError::config(format!(
            "{} must be a positive integer, got '{}': {}",
            key, value, e
        ))),
    }
}
