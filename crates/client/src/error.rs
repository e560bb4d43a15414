//! Errors surfaced to users of either app.
//!
//! Every failure in the session/feed/submission lifecycle ends up as a
//! [`ClientError`]. None of them terminate the process: apps render
//! [`ClientError::user_message`] in an error state instead.

use storehub_core::DraftError;
use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;

const ACCESS_POLICY_HINT: &str =
    "Verify that the backend access policy (security rules) allows this operation.";

/// Client lifecycle errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid backend credentials. Blocks all loading.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Identity redemption or anonymous sign-in failed.
    #[error("Authentication error: {0}")]
    Authentication(#[source] BackendError),

    /// The live feed was rejected or lost. Not retried.
    #[error("Subscription error: {0}")]
    Subscription(#[source] BackendError),

    /// Local draft input is invalid. No network call was made.
    #[error("Validation error: {0}")]
    Validation(#[from] DraftError),

    /// The create-document call did not go through.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

/// Reasons a product write did not happen.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("writes are disabled in read-only mode")]
    ReadOnly,
    #[error("a submission is already in progress")]
    InFlight,
    #[error("{0}")]
    Rejected(#[source] BackendError),
}

impl ClientError {
    /// Human-readable message naming the likely cause.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(e) => format!(
                "The app is not connected to a backend ({e}). Check the backend credentials."
            ),
            Self::Authentication(e) => format!("Sign-in failed: {e}."),
            Self::Subscription(e) => format!("Could not load data: {e}. {ACCESS_POLICY_HINT}"),
            Self::Validation(e) => e.to_string(),
            Self::Write(WriteError::ReadOnly) => {
                "Writes are disabled: the app is running in read-only mode.".to_string()
            }
            Self::Write(WriteError::InFlight) => {
                "A submission is already in progress.".to_string()
            }
            Self::Write(WriteError::Rejected(e)) => {
                format!("Failed to add product: {e}. {ACCESS_POLICY_HINT}")
            }
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn denied() -> BackendError {
        BackendError::Rejected {
            code: "PERMISSION_DENIED".to_string(),
            message: "Missing or insufficient permissions.".to_string(),
        }
    }

    #[test]
    fn test_subscription_message_mentions_access_policy() {
        let message = ClientError::Subscription(denied()).user_message();
        assert!(message.contains("Missing or insufficient permissions."));
        assert!(message.contains("access policy"));
    }

    #[test]
    fn test_write_message_is_verbatim_plus_hint() {
        let message = ClientError::Write(WriteError::Rejected(denied())).user_message();
        assert!(message.contains("PERMISSION_DENIED: Missing or insufficient permissions."));
        assert!(message.contains("access policy"));
    }
}
