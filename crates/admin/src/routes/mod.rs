//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product form and live product list
//! POST /products               - Submit a product draft
//! GET  /api/products           - Product feed as JSON
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check
//! ```

pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/products", post(products::create))
        .route("/api/products", get(products::api))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
