//! Application state shared across handlers.

use std::sync::Arc;

use storehub_client::{
    AuthFallback, BackendConfig, ClientContext, ClientError, ConfigError, FeedState, LiveFeed,
    Session, SessionState,
};
use storehub_core::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It owns the session and the
/// live store feed; dropping the last clone cancels both.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    session: Session,
    /// Absent when the backend could not be configured.
    stores: Option<LiveFeed<Store>>,
}

impl AppState {
    /// Connect to the backend, start the session and subscribe to stores.
    ///
    /// Any configuration failure, including placeholder credentials, yields
    /// a state that renders the configuration error and loads nothing.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(backend: Result<BackendConfig, ConfigError>) -> Self {
        match backend
            .map_err(ClientError::from)
            .and_then(|config| ClientContext::connect(&config))
        {
            Ok(ctx) => Self::with_context(&ctx),
            Err(err) => Self::failed(&err),
        }
    }

    /// Start the session and store feed over an existing context.
    #[must_use]
    pub fn with_context(ctx: &ClientContext) -> Self {
        let session = Session::start(ctx, AuthFallback::FailFast);
        let stores = LiveFeed::spawn(
            ctx.collections(),
            ctx.tenant_id().clone(),
            session.watch(),
        );
        Self {
            inner: Arc::new(AppStateInner {
                session,
                stores: Some(stores),
            }),
        }
    }

    /// A state that only reports `err`.
    #[must_use]
    pub fn failed(err: &ClientError) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                session: Session::failed(err),
                stores: None,
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionState {
        self.inner.session.current()
    }

    /// Current store feed state.
    #[must_use]
    pub fn stores(&self) -> FeedState<Store> {
        self.inner
            .stores
            .as_ref()
            .map_or_else(|| self.unconfigured(), LiveFeed::current)
    }

    /// Wait until the store feed has its first snapshot or failed.
    pub async fn stores_settled(&self) -> FeedState<Store> {
        match &self.inner.stores {
            Some(feed) => feed.settled().await,
            None => self.unconfigured(),
        }
    }

    fn unconfigured(&self) -> FeedState<Store> {
        FeedState {
            loading: false,
            error: Some(
                self.session()
                    .error
                    .unwrap_or_else(|| "The app is not connected to a backend.".to_string()),
            ),
            ..FeedState::default()
        }
    }
}
