//! Catalog search client implementation.
//!
//! This module provides the main client application code uses to search the
//! catalog: validate, compile, execute and project, in that order.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use catalog_search_shared::{SearchResult, TypeaheadSuggestion};

use crate::config::SearchConfig;
use crate::errors::SearchError;
use crate::interfaces::PipelineExecutor;
use crate::pipeline::{compile_export, compile_search, compile_typeahead};
use crate::projector::{project_results, project_suggestions};
use crate::types::{RawSearchQuery, RawTypeaheadQuery, SearchParams, TypeaheadParams};

/// The main client for searching the catalog.
///
/// Stateless apart from the shared executor; safe to clone and use from many
/// tasks at once.
#[derive(Clone)]
pub struct CatalogSearchClient {
    executor: Arc<dyn PipelineExecutor>,
    config: SearchConfig,
}

impl CatalogSearchClient {
    /// Create a new CatalogSearchClient with default configuration.
    pub fn new(executor: Arc<dyn PipelineExecutor>) -> Self {
        Self {
            executor,
            config: SearchConfig::default(),
        }
    }

    /// Create a new CatalogSearchClient with custom configuration.
    pub fn with_config(executor: Arc<dyn PipelineExecutor>, config: SearchConfig) -> Self {
        Self { executor, config }
    }

    /// Validate raw `/search` parameters and run the search.
    ///
    /// Validation failures return before the executor is touched.
    pub async fn search_raw(&self, raw: RawSearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        let params = SearchParams::parse(raw, &self.config)?;
        self.search(&params).await
    }

    /// Run a full search.
    /// Input: SearchParams (term, filters, sort, page)
    /// Output: Result<Vec<SearchResult>, SearchError> (at most one page, store order)
    #[instrument(skip(self, params), fields(term = %params.term, page = params.page.number()))]
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>, SearchError> {
        let pipeline = compile_search(params);
        debug!(pipeline = %pipeline.to_document(), "Compiled search pipeline");

        let page_size = page_ceiling(params.page.size());
        let documents = self.executor.execute(&pipeline, page_size).await?;
        let results = project_results(documents, page_size);

        info!(count = results.len(), "Search completed");
        Ok(results)
    }

    /// Validate raw `/typeahead` parameters and fetch suggestions.
    pub async fn typeahead_raw(
        &self,
        raw: RawTypeaheadQuery,
    ) -> Result<Vec<TypeaheadSuggestion>, SearchError> {
        let params = TypeaheadParams::parse(raw, &self.config)?;
        self.typeahead(&params).await
    }

    /// Fetch typeahead suggestions.
    #[instrument(skip(self, params), fields(term = %params.term))]
    pub async fn typeahead(
        &self,
        params: &TypeaheadParams,
    ) -> Result<Vec<TypeaheadSuggestion>, SearchError> {
        let pipeline = compile_typeahead(params);
        debug!(pipeline = %pipeline.to_document(), "Compiled typeahead pipeline");

        let limit = page_ceiling(params.limit);
        let documents = self.executor.execute(&pipeline, limit).await?;
        Ok(project_suggestions(documents, limit))
    }

    /// Distinct values of a field, used to populate facet listings.
    pub async fn distinct(&self, field: &str) -> Result<Vec<Value>, SearchError> {
        self.executor.distinct(field).await
    }

    /// Every catalog document reduced to `name`, `description` and `keywords`.
    pub async fn export(&self) -> Result<Vec<Value>, SearchError> {
        self.executor.export(&compile_export()).await
    }

    /// Check the executor's store is reachable and healthy.
    pub async fn health_check(&self) -> Result<bool, SearchError> {
        self.executor.health_check().await
    }
}

fn page_ceiling(size: u64) -> usize {
    usize::try_from(size).unwrap_or(usize::MAX)
}
