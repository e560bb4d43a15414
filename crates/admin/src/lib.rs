//! StoreHub Admin library.
//!
//! This crate provides the admin panel as a library, allowing the router to
//! be tested without binding a socket.
//!
//! The panel lists the tenant's products live and appends new ones through a
//! validated form. When the backend cannot be reached or sign-in fails, it
//! keeps running read-only instead of refusing to start.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::{Router, http::Uri};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Build the admin router over `state`.
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
