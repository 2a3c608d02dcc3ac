//! Search error types.
//!
//! This module defines the error taxonomy shared by the parameter model, the
//! pipeline executor and the result projector.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while validating, executing or projecting a search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A request parameter is missing or malformed. Never reaches the store.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The store rejected the pipeline or the call failed in transport.
    #[error("Backend query error: {0}")]
    BackendQueryError(String),

    /// The store did not answer within the configured timeout.
    #[error("Backend query timed out after {}ms", .0.as_millis())]
    BackendTimeout(Duration),

    /// A document field cannot be represented in the response shape.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to set up the connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl SearchError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a backend query error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendQueryError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Whether the failure originated in the document store.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::BackendQueryError(_) | Self::BackendTimeout(_) | Self::ConnectionError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = SearchError::BackendTimeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Backend query timed out after 1500ms");
    }

    #[test]
    fn test_is_backend() {
        assert!(SearchError::backend("boom").is_backend());
        assert!(SearchError::BackendTimeout(Duration::from_secs(1)).is_backend());
        assert!(!SearchError::validation("term is required").is_backend());
        assert!(!SearchError::serialization("bad score").is_backend());
    }
}
