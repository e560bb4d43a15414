//! Integration tests for StoreHub.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storehub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_flow` - Store listing from startup to rendered page
//! - `admin_flow` - Product entry, read-only fallback and idempotency
//! - `hosted_backend` - Both apps against a mocked hosted backend
//!
//! Every scenario runs in-process: apps are driven through their routers
//! with `tower::ServiceExt::oneshot`, over either the in-memory backend or a
//! `wiremock` server standing in for the hosted services.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use storehub_client::ClientContext;
use storehub_client::backend::memory::MemoryBackend;
use storehub_core::{CollectionKind, CollectionPath, Fields, TenantId};
use tower::ServiceExt;

/// Tenant used by every scenario.
pub const TENANT: &str = "t1";

/// Turn a JSON object literal into document fields.
///
/// # Panics
///
/// Panics if `value` is not an object.
#[must_use]
pub fn fields(value: Value) -> Fields {
    let Value::Object(map) = value else {
        panic!("fixture must be a JSON object");
    };
    map
}

/// A signed-out context over `backend` for tenant [`TENANT`].
#[must_use]
pub fn memory_context(backend: &MemoryBackend) -> ClientContext {
    ClientContext::from_services(
        TenantId::new(TENANT),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        None,
        false,
    )
}

/// Collection path of `kind` under [`TENANT`].
#[must_use]
pub fn tenant_path(kind: CollectionKind) -> CollectionPath {
    CollectionPath::new(TenantId::new(TENANT), kind)
}

/// Status and body of a routed request.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

impl Page {
    /// Byte offset of `needle` in the body.
    ///
    /// # Panics
    ///
    /// Panics if the body does not contain `needle`.
    #[must_use]
    pub fn position(&self, needle: &str) -> usize {
        self.body
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not found in page body"))
    }

    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("body is not JSON: {e}"))
    }
}

/// Route one request through `app`.
///
/// # Panics
///
/// Panics if the router fails or the body is not UTF-8.
pub async fn send(app: Router, request: Request<Body>) -> Page {
    let response = app
        .oneshot(request)
        .await
        .unwrap_or_else(|e| panic!("router failed: {e}"));
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("unreadable body: {e}"));
    let body = String::from_utf8(bytes.to_vec()).unwrap_or_else(|e| panic!("body is not UTF-8: {e}"));
    Page { status, body }
}

/// A `GET` request for `uri`.
///
/// # Panics
///
/// Panics if `uri` is not a valid URI.
#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("invalid request: {e}"))
}

/// A form `POST` request for `uri`.
///
/// # Panics
///
/// Panics if `uri` is not a valid URI.
#[must_use]
pub fn post_form(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap_or_else(|e| panic!("invalid request: {e}"))
}
