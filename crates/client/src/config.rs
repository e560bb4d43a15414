//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Credentials
//! - `STOREHUB_API_KEY` - Web API key of the hosted backend
//! - `STOREHUB_PROJECT_ID` - Project hosting the document database
//!
//! Missing or placeholder-looking credentials do not fail loading: they select
//! [`BackendMode::Placeholder`], and each app decides what that means.
//!
//! ## Optional
//! - `STOREHUB_TENANT_ID` - Tenant namespace (default: `default-app-id`)
//! - `STOREHUB_AUTH_TOKEN` - One-time credential token redeemed at startup
//! - `STOREHUB_IDENTITY_URL` - Identity service base URL
//!   (default: `https://identitytoolkit.googleapis.com/v1`)
//! - `STOREHUB_DOCUMENTS_URL` - Document service base URL
//!   (default: `https://firestore.googleapis.com/v1`)
//! - `STOREHUB_POLL_INTERVAL_MS` - Live feed refresh interval (default: 2000)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use storehub_core::TenantId;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TENANT_ID: &str = "default-app-id";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_DOCUMENTS_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const MIN_POLL_INTERVAL_MS: u64 = 100;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "mock",
    "dummy",
    "fake",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Backend credentials unavailable: {0}")]
    PlaceholderCredentials(String),
}

/// Which backend the app talks to.
#[derive(Debug, Clone)]
pub enum BackendMode {
    /// Real hosted identity and document services.
    Hosted(HostedConfig),
    /// Non-functional configuration; the UI may render but must not write.
    Placeholder {
        /// Why the credentials were rejected.
        reason: String,
    },
}

impl BackendMode {
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Hosted backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct HostedConfig {
    pub api_key: SecretString,
    pub project_id: String,
    pub identity_url: Url,
    pub documents_url: Url,
    pub poll_interval: Duration,
}

impl std::fmt::Debug for HostedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedConfig")
            .field("api_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("identity_url", &self.identity_url.as_str())
            .field("documents_url", &self.documents_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Startup configuration shared by both apps.
#[derive(Clone)]
pub struct BackendConfig {
    pub tenant_id: TenantId,
    pub mode: BackendMode,
    /// One-time credential token redeemed instead of anonymous sign-in.
    pub auth_token: Option<SecretString>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("tenant_id", &self.tenant_id)
            .field("mode", &self.mode)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an optional variable is present but invalid.
    /// Missing credentials are reported through [`BackendMode::Placeholder`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`BackendConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tenant_id = TenantId::new(
            get("STOREHUB_TENANT_ID").unwrap_or_else(|| DEFAULT_TENANT_ID.to_string()),
        );
        let auth_token = get("STOREHUB_AUTH_TOKEN").map(SecretString::from);

        let identity_url = parse_url(
            "STOREHUB_IDENTITY_URL",
            get("STOREHUB_IDENTITY_URL").as_deref().unwrap_or(DEFAULT_IDENTITY_URL),
        )?;
        let documents_url = parse_url(
            "STOREHUB_DOCUMENTS_URL",
            get("STOREHUB_DOCUMENTS_URL").as_deref().unwrap_or(DEFAULT_DOCUMENTS_URL),
        )?;
        let poll_interval = parse_poll_interval(get("STOREHUB_POLL_INTERVAL_MS"))?;

        let mode = match (get("STOREHUB_API_KEY"), get("STOREHUB_PROJECT_ID")) {
            (None, _) => BackendMode::Placeholder {
                reason: "STOREHUB_API_KEY is not set".to_string(),
            },
            (_, None) => BackendMode::Placeholder {
                reason: "STOREHUB_PROJECT_ID is not set".to_string(),
            },
            (Some(api_key), Some(project_id)) => {
                match check_credentials(&api_key, &project_id) {
                    Err(reason) => BackendMode::Placeholder { reason },
                    Ok(()) => BackendMode::Hosted(HostedConfig {
                        api_key: SecretString::from(api_key),
                        project_id,
                        identity_url,
                        documents_url,
                        poll_interval,
                    }),
                }
            }
        };

        if let BackendMode::Placeholder { reason } = &mode {
            tracing::warn!(%reason, "Backend credentials unavailable, using placeholder mode");
        }

        Ok(Self {
            tenant_id,
            mode,
            auth_token,
        })
    }

    /// Configuration for a placeholder backend, mainly for tests and demos.
    #[must_use]
    pub fn placeholder(tenant_id: TenantId, reason: impl Into<String>) -> Self {
        Self {
            tenant_id,
            mode: BackendMode::Placeholder {
                reason: reason.into(),
            },
            auth_token: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_poll_interval(value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
    };
    let millis = value.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("STOREHUB_POLL_INTERVAL_MS".to_string(), e.to_string())
    })?;
    if millis < MIN_POLL_INTERVAL_MS {
        return Err(ConfigError::InvalidEnvVar(
            "STOREHUB_POLL_INTERVAL_MS".to_string(),
            format!("must be at least {MIN_POLL_INTERVAL_MS}"),
        ));
    }
    Ok(Duration::from_millis(millis))
}

/// Reject credentials that look like template values.
fn check_credentials(api_key: &str, project_id: &str) -> Result<(), String> {
    if let Some(pattern) = placeholder_pattern(api_key) {
        return Err(format!(
            "STOREHUB_API_KEY appears to be a placeholder (contains '{pattern}')"
        ));
    }
    if let Some(pattern) = placeholder_pattern(project_id) {
        return Err(format!(
            "STOREHUB_PROJECT_ID appears to be a placeholder (contains '{pattern}')"
        ));
    }
    let entropy = shannon_entropy(api_key);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "STOREHUB_API_KEY entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }
    Ok(())
}

fn placeholder_pattern(value: &str) -> Option<&'static str> {
    let lower = value.to_lowercase();
    PLACEHOLDER_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lower.contains(pattern))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const REAL_LOOKING_KEY: &str = "AIzaSyB3xQ9vK2mL7pR4tW8nZ1cF6hJ0dGs5Ye";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_defaults_without_credentials_are_placeholder() {
        let config = BackendConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.tenant_id.as_str(), DEFAULT_TENANT_ID);
        assert!(config.mode.is_placeholder());
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_hosted_mode_with_real_credentials() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("STOREHUB_TENANT_ID", "t1"),
            ("STOREHUB_API_KEY", REAL_LOOKING_KEY),
            ("STOREHUB_PROJECT_ID", "storehub-prod"),
            ("STOREHUB_AUTH_TOKEN", "one-time-token"),
            ("STOREHUB_POLL_INTERVAL_MS", "500"),
        ]))
        .unwrap();
        assert_eq!(config.tenant_id.as_str(), "t1");
        assert_eq!(config.auth_token.unwrap().expose_secret(), "one-time-token");
        let BackendMode::Hosted(hosted) = config.mode else {
            panic!("expected hosted mode");
        };
        assert_eq!(hosted.project_id, "storehub-prod");
        assert_eq!(hosted.poll_interval, Duration::from_millis(500));
        assert_eq!(hosted.identity_url.as_str(), "https://identitytoolkit.googleapis.com/v1");
    }

    #[test]
    fn test_placeholder_api_key_detected() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("STOREHUB_API_KEY", "your-api-key-here"),
            ("STOREHUB_PROJECT_ID", "storehub-prod"),
        ]))
        .unwrap();
        let BackendMode::Placeholder { reason } = config.mode else {
            panic!("expected placeholder mode");
        };
        assert!(reason.contains("your-"));
    }

    #[test]
    fn test_mock_project_detected() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("STOREHUB_API_KEY", REAL_LOOKING_KEY),
            ("STOREHUB_PROJECT_ID", "mock-project"),
        ]))
        .unwrap();
        assert!(config.mode.is_placeholder());
    }

    #[test]
    fn test_low_entropy_key_detected() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("STOREHUB_API_KEY", "aaaaaaaaaaaaaaaaaaaaaaaa"),
            ("STOREHUB_PROJECT_ID", "storehub-prod"),
        ]))
        .unwrap();
        assert!(config.mode.is_placeholder());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("STOREHUB_TENANT_ID", "  "),
            ("STOREHUB_AUTH_TOKEN", ""),
        ]))
        .unwrap();
        assert_eq!(config.tenant_id.as_str(), DEFAULT_TENANT_ID);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_invalid_poll_interval_rejected() {
        let err = BackendConfig::from_lookup(lookup(&[("STOREHUB_POLL_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = BackendConfig::from_lookup(lookup(&[("STOREHUB_POLL_INTERVAL_MS", "5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = BackendConfig::from_lookup(lookup(&[("STOREHUB_DOCUMENTS_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREHUB_DOCUMENTS_URL"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("STOREHUB_API_KEY", REAL_LOOKING_KEY),
            ("STOREHUB_PROJECT_ID", "storehub-prod"),
            ("STOREHUB_AUTH_TOKEN", "super_secret_token_value"),
        ]))
        .unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("storehub-prod"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(REAL_LOOKING_KEY));
        assert!(!debug_output.contains("super_secret_token_value"));
    }
}
