//! HTTP mapping of service errors.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::ServiceError;
use catalog_search_repository::SearchError;

/// Errors returned by handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Search(SearchError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            Self::Search(SearchError::BackendTimeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Search(e) if e.is_backend() => StatusCode::BAD_GATEWAY,
            Self::Search(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::SearchError(e) => Self::Search(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Undecodable query strings are reported like any other bad parameter.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Search(SearchError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        } else {
            warn!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
