//! HTTP surface of the catalog search service.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

/// Build the service router.
///
/// CORS is fully permissive: any origin, method and header.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(handlers::search))
        .route("/typeahead", get(handlers::typeahead))
        .route("/clusters", get(handlers::clusters))
        .route("/csv", get(handlers::csv))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::testing::MockExecutor;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use catalog_search_repository::{CatalogSearchClient, SearchError};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(executor: Arc<MockExecutor>) -> Router {
        router(AppState {
            client: CatalogSearchClient::new(executor),
            clusters: Arc::new(vec![json!("hydrology"), json!("geology")]),
        })
    }

    async fn request(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn request_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = request(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_search_returns_projected_results() {
        let executor = Arc::new(MockExecutor::default().with_documents(vec![json!({
            "_id": "65f0",
            "name": "Soil moisture",
            "score": 2.5,
            "highlights": [
                { "path": "name", "texts": [{ "value": "Soil", "type": "hit" }, { "value": " moisture", "type": "text" }] }
            ]
        })]));

        let (status, body) = request_json(
            app(executor.clone()),
            "/search?term=soil%20moisture&pageNumber=2&pageSize=10",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].get("_id").is_none());
        assert_eq!(results[0]["name"], "Soil moisture");
        assert_eq!(results[0]["score"], 2.5);
        assert_eq!(results[0]["highlights"][0]["texts"][0]["type"], "hit");

        let executed = executor.executed.lock().await;
        let skip = executed[0]
            .stages()
            .iter()
            .find_map(|stage| match stage {
                catalog_search_repository::pipeline::Stage::Skip(n) => Some(*n),
                _ => None,
            });
        assert_eq!(skip, Some(10));
    }

    #[tokio::test]
    async fn test_search_without_matches_is_empty_list() {
        let (status, body) =
            request_json(app(Arc::new(MockExecutor::default())), "/search?term=nothing").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_search_validation_is_400_and_skips_store() {
        let executor = Arc::new(MockExecutor::default());

        for uri in [
            "/search",
            "/search?term=",
            "/search?term=soil&pageNumber=0",
            "/search?term=soil&pageSize=abc",
            "/search?term=soil&publishedStart=20x0",
        ] {
            let (status, body) = request_json(app(executor.clone()), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
        }

        assert!(executor.executed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_query_is_json_400() {
        let executor = Arc::new(MockExecutor::default());

        for uri in ["/search?term=a&term=b", "/typeahead?term=a&term=b"] {
            let (status, body) = request_json(app(executor.clone()), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
        }

        assert!(executor.executed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_inverted_year_range_is_empty_list() {
        let executor = Arc::new(MockExecutor::default());

        let (status, body) = request_json(
            app(executor.clone()),
            "/search?term=soil&publishedStart=2021&publishedEnd=2020",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert_eq!(executor.executed.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_failures_map_to_gateway_statuses() {
        let timeout = Arc::new(
            MockExecutor::default().failing(SearchError::BackendTimeout(Duration::from_secs(10))),
        );
        let (status, _) = request(app(timeout), "/search?term=soil").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

        let rejected = Arc::new(MockExecutor::default().failing(SearchError::backend(
            "No mapping found for [bogus] in order to sort on",
        )));
        let (status, body) = request_json(app(rejected), "/search?term=soil&sortBy=bogus").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("bogus"));
    }

    #[tokio::test]
    async fn test_typeahead() {
        let executor = Arc::new(MockExecutor::default().with_documents(vec![
            json!({ "name": "Soil", "description": null, "keywords": ["soil"], "highlights": [] }),
            json!({ "name": "Soils" }),
        ]));

        let (status, body) = request_json(app(executor), "/typeahead?term=soi&pageSize=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{ "name": "Soil", "description": null, "keywords": ["soil"], "highlights": [] }])
        );
    }

    #[tokio::test]
    async fn test_typeahead_requires_term() {
        let (status, _) = request(app(Arc::new(MockExecutor::default())), "/typeahead").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clusters_served_from_cache() {
        let executor = Arc::new(MockExecutor::default());
        let (status, body) = request_json(app(executor.clone()), "/clusters").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["hydrology", "geology"]));
        assert!(executor.distinct_fields.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_csv_attachment() {
        let executor = Arc::new(MockExecutor::default().with_export(vec![
            json!({ "name": "Soil moisture", "description": "Daily", "keywords": ["soil", "water"] }),
        ]));

        let response = app(executor)
            .oneshot(Request::builder().uri("/csv").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"catalog.csv\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "name,description,keywords\nSoil moisture,Daily,soil; water\n"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = request_json(app(Arc::new(MockExecutor::default())), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = app(Arc::new(MockExecutor::default()))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
