//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `PipelineExecutor`
//! using the OpenSearch Rust client.

use std::future::Future;

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    ClearScrollParts, OpenSearch, ScrollParts, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::ExecutorConfig;
use crate::errors::SearchError;
use crate::interfaces::PipelineExecutor;
use crate::opensearch::hits::{extract_hits, normalize_hit};
use crate::opensearch::queries::{build_distinct_query, build_search_body, SearchPlan};
use crate::pipeline::{Pipeline, StageKind};

/// How long a scroll context stays alive between export batches.
const SCROLL_KEEP_ALIVE: &str = "1m";

/// Upper bound on distinct values returned by a terms aggregation.
const DISTINCT_LIMIT: usize = 10_000;

/// OpenSearch-backed pipeline executor.
///
/// Holds the process-wide connection pool. Build it once at startup, share it
/// behind an `Arc`, and drop it at shutdown.
///
/// # Example
///
/// ```ignore
/// use catalog_search_repository::{ExecutorConfig, OpenSearchExecutor};
///
/// let executor = OpenSearchExecutor::new("http://localhost:9200", ExecutorConfig::new("cznet"))?;
/// let pipeline = compile_search(&SearchParams::new("soil moisture")?);
/// let documents = executor.execute(&pipeline, 30).await?;
/// ```
pub struct OpenSearchExecutor {
    client: OpenSearch,
    config: ExecutorConfig,
}

impl OpenSearchExecutor {
    /// Create a new executor connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `config` - Index name, timeout and export batch size
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchExecutor)` - A new executor instance
    /// * `Err(SearchError)` - If connection setup fails
    pub fn new(url: &str, config: ExecutorConfig) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %config.index,
            timeout_ms = config.timeout.as_millis() as u64,
            "Created OpenSearch executor"
        );

        Ok(Self { client, config })
    }

    /// Run a store call under the configured timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SearchError>>,
    ) -> Result<T, SearchError> {
        tokio::time::timeout(self.config.timeout, call)
            .await
            .map_err(|_| {
                warn!(timeout_ms = self.config.timeout.as_millis() as u64, "Store call timed out");
                SearchError::BackendTimeout(self.config.timeout)
            })?
    }

    async fn send_search(&self, body: &Value, scroll: Option<&str>) -> Result<Value, SearchError> {
        let index = [self.config.index.as_str()];
        let mut request = self
            .client
            .search(SearchParts::Index(&index))
            .body(body.clone());
        if let Some(keep_alive) = scroll {
            request = request.scroll(keep_alive);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::backend(e.to_string()))?;

        Self::read_json(response, "Search").await
    }

    async fn send_scroll(&self, scroll_id: &str) -> Result<Value, SearchError> {
        let response = self
            .client
            .scroll(ScrollParts::None)
            .body(json!({
                "scroll": SCROLL_KEEP_ALIVE,
                "scroll_id": scroll_id
            }))
            .send()
            .await
            .map_err(|e| SearchError::backend(e.to_string()))?;

        Self::read_json(response, "Scroll").await
    }

    async fn clear_scroll(&self, scroll_id: &str) {
        let result = self
            .client
            .clear_scroll(ClearScrollParts::None)
            .body(json!({ "scroll_id": [scroll_id] }))
            .send()
            .await;

        if let Err(e) = result {
            warn!(error = %e, "Failed to clear scroll context");
        }
    }

    /// Fail on non-success statuses, otherwise decode the body.
    async fn read_json(response: Response, operation: &str) -> Result<Value, SearchError> {
        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "{} request failed", operation);
            return Err(SearchError::backend(format!(
                "{} failed with status {}: {}",
                operation, status, error_body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::backend(format!("Failed to decode response: {}", e)))
    }

    /// Page through every scroll batch, recording the live scroll id so the
    /// caller can clear it whatever the outcome.
    async fn collect_scroll(
        &self,
        plan: &SearchPlan,
        scroll_id: &mut Option<String>,
    ) -> Result<Vec<Value>, SearchError> {
        let mut documents = Vec::new();
        let mut response = self
            .bounded(self.send_search(&plan.body, Some(SCROLL_KEEP_ALIVE)))
            .await?;

        loop {
            if let Some(id) = response["_scroll_id"].as_str() {
                *scroll_id = Some(id.to_string());
            }

            let hits = extract_hits(&response)?;
            if hits.is_empty() {
                break;
            }
            documents.extend(hits.iter().map(|hit| normalize_hit(hit, &plan.shaping)));
            debug!(exported = documents.len(), "Fetched export batch");

            let Some(id) = scroll_id.clone() else {
                break;
            };
            response = self.bounded(self.send_scroll(&id)).await?;
        }

        Ok(documents)
    }
}

#[async_trait]
impl PipelineExecutor for OpenSearchExecutor {
    #[instrument(skip(self, pipeline), fields(stages = pipeline.len()))]
    async fn execute(
        &self,
        pipeline: &Pipeline,
        ceiling: usize,
    ) -> Result<Vec<Value>, SearchError> {
        let plan = build_search_body(pipeline, ceiling)?;
        if plan.size == 0 {
            debug!("Page lies outside the result window");
            return Ok(Vec::new());
        }

        debug!(body = %plan.body, "Executing search pipeline");
        let response = self.bounded(self.send_search(&plan.body, None)).await?;
        let hits = extract_hits(&response)?;

        Ok(hits
            .iter()
            .take(ceiling)
            .map(|hit| normalize_hit(hit, &plan.shaping))
            .collect())
    }

    #[instrument(skip(self, pipeline), fields(stages = pipeline.len()))]
    async fn export(&self, pipeline: &Pipeline) -> Result<Vec<Value>, SearchError> {
        if pipeline
            .kinds()
            .iter()
            .any(|kind| matches!(kind, StageKind::Skip | StageKind::Limit | StageKind::Sort))
        {
            return Err(SearchError::backend(
                "malformed pipeline: export pipelines cannot sort or paginate",
            ));
        }

        let plan = build_search_body(pipeline, self.config.export_batch_size)?;

        let mut scroll_id = None;
        let result = self.collect_scroll(&plan, &mut scroll_id).await;
        if let Some(id) = scroll_id {
            self.clear_scroll(&id).await;
        }

        let documents = result?;
        info!(count = documents.len(), "Exported catalog documents");
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn distinct(&self, field: &str) -> Result<Vec<Value>, SearchError> {
        let body = build_distinct_query(field, DISTINCT_LIMIT);
        let response = self.bounded(self.send_search(&body, None)).await?;

        let aggregation = &response["aggregations"]["distinct"];
        let buckets = aggregation["buckets"]
            .as_array()
            .ok_or_else(|| SearchError::backend("aggregation response is missing buckets"))?;

        let omitted = aggregation["sum_other_doc_count"].as_u64().unwrap_or(0);
        if omitted > 0 {
            warn!(
                field = %field,
                limit = DISTINCT_LIMIT,
                omitted_documents = omitted,
                "Distinct values truncated"
            );
        }

        Ok(buckets
            .iter()
            .filter_map(|bucket| bucket.get("key").cloned())
            .collect())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let call = async {
            let response = self
                .client
                .cluster()
                .health(ClusterHealthParts::None)
                .send()
                .await
                .map_err(|e| SearchError::connection(e.to_string()))?;
            Self::read_json(response, "Health check").await
        };
        let body = self.bounded(call).await?;

        let status = body["status"].as_str().unwrap_or("red");
        debug!(status = %status, "Cluster health");
        Ok(status != "red")
    }
}
