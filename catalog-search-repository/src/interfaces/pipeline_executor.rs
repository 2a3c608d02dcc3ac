//! Pipeline executor trait definition.
//!
//! This module defines the boundary between the query-compilation core and the
//! document store.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::pipeline::Pipeline;

/// Abstract interface for running compiled pipelines against a document store.
///
/// Implementations own the store connection. They are built once at startup,
/// shared across requests behind an `Arc`, and dropped at shutdown.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// Timeouts, transport failures and pipelines the store rejects all surface as
/// `SearchError::BackendQueryError` or `SearchError::BackendTimeout`. Nothing
/// is retried.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    /// Run a pipeline and return at most `ceiling` documents, in store order.
    ///
    /// Documents keep the internal identifier and any metadata the pipeline's
    /// field-shaping stages attach (`score`, `highlights`).
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The compiled stage sequence
    /// * `ceiling` - Upper bound on returned documents
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Value>)` - The matched documents
    /// * `Err(SearchError)` - If the pipeline is malformed or the store call fails
    async fn execute(&self, pipeline: &Pipeline, ceiling: usize)
        -> Result<Vec<Value>, SearchError>;

    /// Run a pipeline over the whole collection without a result ceiling.
    ///
    /// Used by the catalog export; implementations page through the store
    /// internally.
    async fn export(&self, pipeline: &Pipeline) -> Result<Vec<Value>, SearchError>;

    /// Distinct values of a field across the collection.
    async fn distinct(&self, field: &str) -> Result<Vec<Value>, SearchError>;

    /// Check if the store is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the store is healthy
    /// * `Ok(false)` - If the store is reachable but unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
