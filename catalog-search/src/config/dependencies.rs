//! Dependency initialization and wiring for the catalog search service.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::Settings;
use crate::ServiceError;
use catalog_search_repository::{CatalogSearchClient, OpenSearchExecutor, PipelineExecutor};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Search client sharing the process-wide executor.
    pub client: CatalogSearchClient,
    /// Distinct cluster values, loaded once at startup.
    pub clusters: Arc<Vec<Value>>,
}

impl Dependencies {
    /// Initialize all dependencies against OpenSearch.
    ///
    /// # Arguments
    ///
    /// * `settings` - Settings read at startup
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If the store is unreachable or unhealthy
    pub async fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index,
            "Initializing dependencies"
        );

        let executor = OpenSearchExecutor::new(&settings.opensearch_url, settings.executor_config())
            .map_err(|e| ServiceError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        Self::with_executor(Arc::new(executor), settings).await
    }

    /// Wire dependencies around an already-built executor.
    ///
    /// Verifies the store is healthy, then caches the `/clusters` listing.
    pub async fn with_executor(
        executor: Arc<dyn PipelineExecutor>,
        settings: &Settings,
    ) -> Result<Self, ServiceError> {
        let client = CatalogSearchClient::with_config(executor, settings.search_config());

        // Verify OpenSearch is reachable
        let healthy = client
            .health_check()
            .await
            .map_err(|e| ServiceError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(ServiceError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let clusters = client.distinct(&settings.clusters_field).await?;
        info!(
            field = %settings.clusters_field,
            count = clusters.len(),
            "Loaded cluster listing"
        );

        Ok(Self {
            client,
            clusters: Arc::new(clusters),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockExecutor;
    use catalog_search_repository::SearchError;
    use serde_json::json;
    use std::collections::HashMap;

    fn settings() -> Settings {
        let vars: HashMap<&str, &str> = HashMap::from([("CLUSTERS_FIELD", "topics")]);
        Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_loads_clusters_once() {
        let executor = Arc::new(MockExecutor::default().with_distinct(vec![json!("hydrology")]));

        let deps = Dependencies::with_executor(executor.clone(), &settings())
            .await
            .unwrap();

        assert_eq!(*deps.clusters, vec![json!("hydrology")]);
        assert_eq!(*executor.distinct_fields.lock().await, vec!["topics".to_string()]);
    }

    #[tokio::test]
    async fn test_unhealthy_store_is_config_error() {
        let executor = Arc::new(MockExecutor::default().unhealthy());

        let result = Dependencies::with_executor(executor, &settings()).await;
        assert!(matches!(result, Err(ServiceError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_cluster_load_failure_propagates() {
        let executor = Arc::new(
            MockExecutor::default().failing(SearchError::connection("connection refused")),
        );

        let result = Dependencies::with_executor(executor, &settings()).await;
        assert!(result.is_err());
    }
}
