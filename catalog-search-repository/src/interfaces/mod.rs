//! Interface definitions for the document store.
//!
//! This module defines the abstract `PipelineExecutor` trait that allows
//! for dependency injection and swappable store implementations.

mod pipeline_executor;

pub use pipeline_executor::PipelineExecutor;
