//! # Catalog Search
//!
//! HTTP service for searching the scientific-resource catalog.
//!
//! This crate provides the settings, dependency wiring, HTTP routes and CSV
//! export for running the catalog search API.

pub mod api;
pub mod config;
pub mod export;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] catalog_search_repository::SearchError),

    /// Export error.
    #[error("Export error: {0}")]
    ExportError(String),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an export error.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::ExportError(msg.into())
    }
}
