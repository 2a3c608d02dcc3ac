//! Route handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use catalog_search_repository::{RawSearchQuery, RawTypeaheadQuery};
use catalog_search_shared::{SearchResult, TypeaheadSuggestion};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::export::write_csv;

/// File name offered for `/csv` downloads.
pub const EXPORT_FILE_NAME: &str = "catalog.csv";

/// `GET /search`
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<RawSearchQuery>, QueryRejection>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let Query(raw) = query?;
    info!(
        term = raw.term.as_deref().unwrap_or_default(),
        page = raw.page_number.as_deref().unwrap_or("1"),
        "Search request"
    );

    let results = state.client.search_raw(raw).await?;
    Ok(Json(results))
}

/// `GET /typeahead`
pub async fn typeahead(
    State(state): State<AppState>,
    query: Result<Query<RawTypeaheadQuery>, QueryRejection>,
) -> Result<Json<Vec<TypeaheadSuggestion>>, ApiError> {
    let Query(raw) = query?;
    info!(
        term = raw.term.as_deref().unwrap_or_default(),
        "Typeahead request"
    );

    let suggestions = state.client.typeahead_raw(raw).await?;
    Ok(Json(suggestions))
}

/// `GET /clusters`: the listing cached at startup.
pub async fn clusters(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.clusters.as_ref().clone())
}

/// `GET /csv`: every document as a CSV attachment.
pub async fn csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.client.export().await?;
    let body = write_csv(&rows)?;
    info!(rows = rows.len(), bytes = body.len(), "Exported catalog");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    ))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
