//! Identity service wire types.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `accounts:signInWithCustomToken`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTokenRequest<'a> {
    pub token: &'a str,
    pub return_secure_token: bool,
}

/// Body of `accounts:signUp` (anonymous when no email is given).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSignUpRequest {
    pub return_secure_token: bool,
}

/// Successful sign-in response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub local_id: Option<String>,
}

impl SignInResponse {
    /// User id of the signed-in account.
    ///
    /// Custom-token responses omit `localId`, so fall back to the claims of
    /// the ID token.
    #[must_use]
    pub fn uid(&self) -> Option<String> {
        self.local_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| uid_from_id_token(&self.id_token))
    }
}

/// Error envelope shared by the identity and document services.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Read the `user_id` (or `sub`) claim of an unverified JWT.
///
/// The token was just issued to us over TLS; its signature is the backend's
/// concern, not ours.
#[must_use]
pub fn uid_from_id_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims
        .get("user_id")
        .or_else(|| claims.get("sub"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
