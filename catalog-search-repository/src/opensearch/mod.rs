//! OpenSearch implementation of the pipeline executor.
//!
//! This module provides a concrete implementation of `PipelineExecutor`
//! using OpenSearch as the document store.

mod client;
mod hits;
mod queries;

pub use client::OpenSearchExecutor;
pub use hits::parse_fragment;
pub use queries::{build_search_body, HitShaping, SearchPlan};
