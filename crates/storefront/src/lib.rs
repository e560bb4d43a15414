//! StoreHub Storefront library.
//!
//! This crate provides the storefront as a library, allowing the router to
//! be tested without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod routes;
pub mod state;

use axum::{Router, http::Uri};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Build the storefront router over `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use storehub_client::backend::memory::MemoryBackend;
    use storehub_client::{ClientContext, ClientError, ConfigError};
    use storehub_core::{CollectionKind, CollectionPath, Fields, TenantId};
    use tower::ServiceExt;

    use super::*;

    fn fields(value: Value) -> Fields {
        let Value::Object(map) = value else {
            panic!("fixture must be an object");
        };
        map
    }

    fn context(backend: &MemoryBackend) -> ClientContext {
        ClientContext::from_services(
            TenantId::new("t1"),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            None,
            false,
        )
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, String) {
        let response = app(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_lists_stores_in_name_order() {
        let backend = MemoryBackend::new();
        let path = CollectionPath::new(TenantId::new("t1"), CollectionKind::Stores);
        backend.put(&path, "s1", fields(json!({"name": "Zeta Mart", "rating": 4.0, "deliveryTime": 30})));
        backend.put(&path, "s2", fields(json!({"name": "Alpha Deli", "rating": 4.5, "deliveryTime": 20})));
        let state = AppState::with_context(&context(&backend));
        state.stores_settled().await;

        let (status, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        let alpha = body.find("Alpha Deli").unwrap();
        let zeta = body.find("Zeta Mart").unwrap();
        assert!(alpha < zeta);
        assert!(body.contains("20 min"));
    }

    #[tokio::test]
    async fn test_api_reports_feed_error() {
        let backend = MemoryBackend::new();
        backend.fail_subscribe("Missing or insufficient permissions.");
        let state = AppState::with_context(&context(&backend));
        state.stores_settled().await;

        let (status, body) = get(&state, "/api/stores").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("access policy"));
    }

    #[tokio::test]
    async fn test_api_returns_items() {
        let backend = MemoryBackend::new();
        let path = CollectionPath::new(TenantId::new("t1"), CollectionKind::Stores);
        backend.put(&path, "s1", fields(json!({"name": "Alpha Deli"})));
        let state = AppState::with_context(&context(&backend));
        state.stores_settled().await;

        let (status, body) = get(&state, "/api/stores").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["loading"], false);
        assert_eq!(json["items"][0]["name"], "Alpha Deli");
    }

    #[tokio::test]
    async fn test_configuration_error_page() {
        let err = ClientError::Configuration(ConfigError::PlaceholderCredentials(
            "STOREHUB_API_KEY is not set".to_string(),
        ));
        let state = AppState::failed(&err);

        let (status, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("STOREHUB_API_KEY is not set"));
        assert!(!body.contains("Loading stores"));

        let (status, _) = get(&state, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_while_signing_in() {
        let backend = MemoryBackend::new();
        let gate = backend.hold_sign_in();
        let state = AppState::with_context(&context(&backend));

        let (status, _) = get(&state, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (_, body) = get(&state, "/").await;
        assert!(body.contains("Loading stores"));
        assert_eq!(backend.subscribe_calls(), 0);

        gate.release();
        state.stores_settled().await;
        let (status, _) = get(&state, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let state = AppState::with_context(&context(&MemoryBackend::new()));
        let (status, body) = get(&state, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("/nope"));
    }
}
