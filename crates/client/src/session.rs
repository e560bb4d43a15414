//! Session bootstrap.
//!
//! [`Session::start`] performs exactly one authentication action (redeem the
//! configured credential token, otherwise sign in anonymously) and flips the
//! readiness flag exactly once when that action settles, successfully or not.
//! An identity-change listener keeps the session identity in sync for the
//! lifetime of the [`Session`] and is aborted when it is dropped.

use storehub_core::Identity;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::backend::ListenerGuard;
use crate::context::ClientContext;
use crate::error::ClientError;

/// What to do when authentication fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFallback {
    /// Surface the failure and load nothing.
    FailFast,
    /// Continue with a locally generated placeholder identity, read-only.
    PlaceholderReadOnly,
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// Set once the single authentication attempt has settled.
    pub ready: bool,
    /// Writes must not be attempted.
    pub read_only: bool,
    /// User-facing message of a configuration or authentication failure.
    pub error: Option<String>,
}

impl SessionState {
    /// Whether the session may issue writes.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.ready
            && !self.read_only
            && self.identity.as_ref().is_some_and(|i| !i.is_placeholder())
    }
}

/// A running session.
///
/// Owns the identity listener and the bootstrap task; dropping the session
/// deregisters both.
#[derive(Debug)]
pub struct Session {
    state: watch::Receiver<SessionState>,
    _listener: Option<ListenerGuard>,
    _bootstrap: Option<ListenerGuard>,
}

impl Session {
    /// Start the session against `ctx`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(ctx: &ClientContext, fallback: AuthFallback) -> Self {
        let (tx, rx) = watch::channel(SessionState {
            read_only: ctx.is_placeholder(),
            ..SessionState::default()
        });

        let listener = spawn_identity_listener(ctx, tx.clone());

        let bootstrap_ctx = ctx.clone();
        let bootstrap = tokio::spawn(async move {
            let outcome = authenticate(&bootstrap_ctx, fallback).await;
            tx.send_if_modified(|state| {
                if state.ready {
                    return false;
                }
                state.ready = true;
                match outcome {
                    AuthOutcome::SignedIn(identity) => state.identity = Some(identity),
                    AuthOutcome::Degraded { placeholder, message } => {
                        state.identity = Some(placeholder);
                        state.read_only = true;
                        state.error = Some(message);
                    }
                    AuthOutcome::Failed(message) => {
                        state.identity = None;
                        state.error = Some(message);
                    }
                }
                true
            });
        });

        Self {
            state: rx,
            _listener: Some(listener),
            _bootstrap: Some(ListenerGuard::new(bootstrap)),
        }
    }

    /// A session that failed before authentication could start, e.g. on a
    /// configuration error. It is ready immediately and carries the error.
    #[must_use]
    pub fn failed(err: &ClientError) -> Self {
        error!(error = %err, "Session failed to start");
        let (_tx, rx) = watch::channel(SessionState {
            identity: None,
            ready: true,
            read_only: true,
            error: Some(err.user_message()),
        });
        Self {
            state: rx,
            _listener: None,
            _bootstrap: None,
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver for observing state changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the session is ready and return that state.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.state.clone();
        // The sender lives in the bootstrap task; if it is gone the current
        // value is final.
        if let Ok(state) = rx.wait_for(|s| s.ready).await {
            return state.clone();
        }
        rx.borrow().clone()
    }
}

enum AuthOutcome {
    SignedIn(Identity),
    Degraded { placeholder: Identity, message: String },
    Failed(String),
}

async fn authenticate(ctx: &ClientContext, fallback: AuthFallback) -> AuthOutcome {
    let identity = ctx.identity();
    let result = match ctx.auth_token() {
        Some(token) => {
            info!("Redeeming supplied credential token");
            identity.sign_in_with_custom_token(token).await
        }
        None => {
            info!("Signing in anonymously");
            identity.sign_in_anonymously().await
        }
    };

    match result {
        Ok(identity) => {
            info!(uid = %identity.uid, "Session ready");
            AuthOutcome::SignedIn(identity)
        }
        Err(e) => {
            let err = ClientError::Authentication(e);
            match fallback {
                AuthFallback::FailFast => {
                    error!(error = %err, "Authentication failed");
                    AuthOutcome::Failed(err.user_message())
                }
                AuthFallback::PlaceholderReadOnly => {
                    let placeholder = Identity::placeholder();
                    warn!(
                        error = %err,
                        uid = %placeholder.uid,
                        "Authentication failed, continuing read-only with placeholder identity"
                    );
                    AuthOutcome::Degraded {
                        placeholder,
                        message: err.user_message(),
                    }
                }
            }
        }
    }
}

/// Forward identity-service changes into the session once it is ready.
fn spawn_identity_listener(
    ctx: &ClientContext,
    tx: watch::Sender<SessionState>,
) -> ListenerGuard {
    let mut changes = ctx.identity().identity_changes();
    changes.mark_unchanged();
    ListenerGuard::new(tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let identity = changes.borrow_and_update().clone();
            tx.send_if_modified(|state| {
                // The bootstrap publishes the first identity together with
                // readiness; a placeholder is never replaced by the service.
                let keep_placeholder = state.identity.as_ref().is_some_and(Identity::is_placeholder);
                if !state.ready || keep_placeholder || state.identity == identity {
                    return false;
                }
                info!(uid = ?identity.as_ref().map(|i| i.uid.as_str()), "Identity changed");
                state.identity = identity;
                true
            });
        }
    }))
}
