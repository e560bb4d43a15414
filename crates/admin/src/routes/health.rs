//! Health check handlers.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Ready once sign-in has settled and the product feed delivered its first
/// snapshot or failed. Read-only mode still counts as ready.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.session().ready && !state.products().loading {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
