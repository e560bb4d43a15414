//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Store list page
//! GET  /api/stores             - Store feed as JSON
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check
//! ```

pub mod health;
pub mod stores;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/api/stores", get(stores::api))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
