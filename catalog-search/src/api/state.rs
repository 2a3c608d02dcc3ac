//! Shared request state.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Dependencies;
use catalog_search_repository::CatalogSearchClient;

/// State handed to every handler.
///
/// Cloned per request; both fields are cheap `Arc` clones.
#[derive(Clone)]
pub struct AppState {
    pub client: CatalogSearchClient,
    pub clusters: Arc<Vec<Value>>,
}

impl From<Dependencies> for AppState {
    fn from(deps: Dependencies) -> Self {
        Self {
            client: deps.client,
            clusters: deps.clusters,
        }
    }
}
