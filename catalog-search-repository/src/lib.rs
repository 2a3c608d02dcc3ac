//! # Catalog Search Repository
//!
//! This crate turns catalog search requests into store pipelines and store
//! documents into responses. It includes the request model, the pipeline
//! compilers, the `PipelineExecutor` interface with an OpenSearch
//! implementation, and the result projector.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod pipeline;
pub mod projector;
pub mod types;

pub use client::CatalogSearchClient;
pub use config::{ExecutorConfig, SearchConfig};
pub use errors::SearchError;
pub use interfaces::PipelineExecutor;
pub use opensearch::OpenSearchExecutor;
pub use types::{RawSearchQuery, RawTypeaheadQuery, SearchParams, TypeaheadParams};
