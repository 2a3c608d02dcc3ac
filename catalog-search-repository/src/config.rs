//! Configuration types for the catalog search client and executor.

use std::time::Duration;

/// Default ceiling for `pageSize`.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 1000;

/// Default per-call timeout for store requests.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of documents fetched per scroll batch during export.
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 1000;

/// Configuration for the CatalogSearchClient.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Ceiling for `pageSize`; larger requests are clamped to it.
    /// Set to None to disable the limit (not recommended for production).
    pub max_page_size: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_page_size: Some(DEFAULT_MAX_PAGE_SIZE),
        }
    }
}

impl SearchConfig {
    /// Create a config with a custom page size limit.
    pub fn with_max_page_size(max_page_size: u64) -> Self {
        Self {
            max_page_size: Some(max_page_size),
        }
    }
}

/// Configuration for the store-facing executor.
///
/// Built once at startup and moved into the executor; the executor owns it for
/// the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Index holding the resource documents.
    pub index: String,
    /// Upper bound on every store call.
    pub timeout: Duration,
    /// Documents per scroll batch when exporting the whole catalog.
    pub export_batch_size: usize,
}

impl ExecutorConfig {
    /// Create a config for the given index with default timeout and batch size.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            timeout: DEFAULT_BACKEND_TIMEOUT,
            export_batch_size: DEFAULT_EXPORT_BATCH_SIZE,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the export batch size.
    pub fn with_export_batch_size(mut self, export_batch_size: usize) -> Self {
        self.export_batch_size = export_batch_size.max(1);
        self
    }
}
