//! Application state shared across handlers.

use std::sync::Arc;

use storehub_client::backend::memory::MemoryBackend;
use storehub_client::config::DEFAULT_TENANT_ID;
use storehub_client::{
    AuthFallback, BackendConfig, BackendMode, ClientContext, ConfigError, DraftSubmitter,
    FeedState, LiveFeed, Session, SessionState,
};
use storehub_core::{Product, TenantId};
use tracing::{error, warn};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Owns the session, the live product feed and
/// the submitter; dropping the last clone cancels the listeners.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    session: Session,
    products: LiveFeed<Product>,
    submitter: DraftSubmitter,
    /// Why the panel runs read-only, when it does so from startup.
    notice: Option<String>,
}

impl AppState {
    /// Connect to the backend, or fall back to a read-only in-memory backend
    /// when the configuration is missing, a placeholder, or invalid.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(backend: Result<BackendConfig, ConfigError>) -> Self {
        let config = backend.unwrap_or_else(|e| {
            warn!(error = %e, "Invalid backend configuration");
            BackendConfig::placeholder(TenantId::new(DEFAULT_TENANT_ID), e.to_string())
        });
        let notice = match &config.mode {
            BackendMode::Placeholder { reason } => Some(reason.clone()),
            BackendMode::Hosted(_) => None,
        };

        match ClientContext::connect_or_placeholder(&config) {
            Ok(ctx) => Self::with_context(&ctx, notice),
            Err(e) => {
                error!(error = %e, "Could not connect to backend");
                let ctx = ClientContext::placeholder(config.tenant_id, MemoryBackend::new());
                Self::with_context(&ctx, Some(e.user_message()))
            }
        }
    }

    /// Start the session, product feed and submitter over `ctx`.
    #[must_use]
    pub fn with_context(ctx: &ClientContext, notice: Option<String>) -> Self {
        let session = Session::start(ctx, AuthFallback::PlaceholderReadOnly);
        let products = LiveFeed::spawn(
            ctx.collections(),
            ctx.tenant_id().clone(),
            session.watch(),
        );
        Self {
            inner: Arc::new(AppStateInner {
                session,
                products,
                submitter: DraftSubmitter::new(ctx),
                notice,
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionState {
        self.inner.session.current()
    }

    /// Wait for the single sign-in attempt to settle.
    pub async fn session_ready(&self) -> SessionState {
        self.inner.session.ready().await
    }

    #[must_use]
    pub fn products(&self) -> FeedState<Product> {
        self.inner.products.current()
    }

    /// Wait until the product feed has its first snapshot or failed.
    pub async fn products_settled(&self) -> FeedState<Product> {
        self.inner.products.settled().await
    }

    #[must_use]
    pub fn submitter(&self) -> &DraftSubmitter {
        &self.inner.submitter
    }

    /// Explanation shown while the panel is read-only.
    #[must_use]
    pub fn read_only_notice(&self) -> Option<String> {
        let session = self.session();
        if !session.read_only {
            return None;
        }
        self.inner
            .notice
            .clone()
            .or(session.error)
            .or_else(|| Some("Writes are disabled.".to_string()))
    }
}
