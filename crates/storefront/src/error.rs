//! Unified error handling.
//!
//! Feed failures are reported to Sentry once by the feed task. `AppError`
//! only replays them to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// The store feed is in its error state. Carries the user-facing message.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The feed reports its own failure once; this is just the replay.
        if let Self::Unavailable(message) = &self {
            tracing::debug!(%message, "Serving feed error");
        }

        let status = match &self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let message = match self {
            Self::Unavailable(message) => message,
            Self::NotFound(path) => format!("Not found: {path}"),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_is_not_captured_per_request() {
        let events = sentry::test::with_captured_events(|| {
            for _ in 0..3 {
                let response = AppError::Unavailable("feed down".to_string()).into_response();
                assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            }
        });
        assert!(events.is_empty());
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Unavailable("feed down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::NotFound("page".to_string())),
            StatusCode::NOT_FOUND
        );
    }
}
