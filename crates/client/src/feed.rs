//! Live collection subscriber.
//!
//! A [`LiveFeed`] waits for the session to become ready, opens exactly one
//! subscription and republishes every snapshot as a sorted, wholesale
//! replacement of its item list. A subscription error is final: the feed
//! moves to its error state and publishes nothing more.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use storehub_core::{CatalogItem, CollectionPath, TenantId, sort_snapshot};
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::backend::{CollectionService, ListenerGuard, SnapshotStream};
use crate::error::ClientError;
use crate::session::SessionState;

/// Published state of a feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedState<T> {
    pub loading: bool,
    /// Latest snapshot in display order.
    pub items: Vec<T>,
    pub error: Option<String>,
    /// Incremented on every publish.
    pub revision: u64,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            loading: true,
            items: Vec::new(),
            error: None,
            revision: 0,
        }
    }
}

/// What the presentation layer should render.
#[derive(Debug, PartialEq)]
pub enum ViewState<'a, T> {
    Loading,
    Error(&'a str),
    Empty,
    Populated(&'a [T]),
}

impl<T> FeedState<T> {
    /// Error wins over loading, loading over the list.
    #[must_use]
    pub fn view(&self) -> ViewState<'_, T> {
        if let Some(message) = &self.error {
            ViewState::Error(message)
        } else if self.loading {
            ViewState::Loading
        } else if self.items.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Populated(&self.items)
        }
    }

    /// Whether the feed has left its loading state.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.loading || self.error.is_some()
    }
}

/// Handle on a running feed. Dropping it cancels the subscription.
pub struct LiveFeed<T> {
    state: watch::Receiver<FeedState<T>>,
    _task: ListenerGuard,
    _item: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for LiveFeed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("kind", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: CatalogItem> LiveFeed<T> {
    /// Spawn the feed for `T`'s collection under `tenant`, gated on
    /// `session` readiness.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        collections: Arc<dyn CollectionService>,
        tenant: TenantId,
        session: watch::Receiver<SessionState>,
    ) -> Self {
        let path = CollectionPath::new(tenant, T::KIND);
        let (tx, rx) = watch::channel(FeedState::default());
        let span = info_span!("live_feed", path = %path);
        let task = tokio::spawn(run_feed::<T>(collections, path, session, tx).instrument(span));
        Self {
            state: rx,
            _task: ListenerGuard::new(task),
            _item: PhantomData,
        }
    }
}

impl<T: Clone> LiveFeed<T> {
    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> FeedState<T> {
        self.state.borrow().clone()
    }

    /// A receiver for observing state changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<FeedState<T>> {
        self.state.clone()
    }

    /// Wait until the feed has delivered its first snapshot or failed.
    pub async fn settled(&self) -> FeedState<T> {
        let mut rx = self.state.clone();
        if let Ok(state) = rx.wait_for(FeedState::is_settled).await {
            return state.clone();
        }
        rx.borrow().clone()
    }
}

/// Why a single subscription ended.
enum Ended {
    /// Readiness dropped; wait for it to return and subscribe again.
    NotReady,
    /// Terminal error already published.
    Failed,
    /// The session went away.
    Shutdown,
}

async fn run_feed<T: CatalogItem>(
    collections: Arc<dyn CollectionService>,
    path: CollectionPath,
    mut session: watch::Receiver<SessionState>,
    tx: watch::Sender<FeedState<T>>,
) {
    loop {
        let state = match session.wait_for(|s| s.ready).await {
            Ok(state) => state.clone(),
            Err(_) => return,
        };

        let ended = if state.identity.is_none() {
            let message = state
                .error
                .unwrap_or_else(|| "Not signed in.".to_string());
            warn!(%message, "Session ready without identity, not subscribing");
            publish_error(&tx, message);
            Ended::Failed
        } else {
            match collections.subscribe(&path).await {
                Ok(stream) => {
                    info!("Subscribed");
                    consume(stream, &mut session, &tx).await
                }
                Err(e) => {
                    let err = ClientError::Subscription(e);
                    error!(error = %err, "Subscription rejected");
                    publish_error(&tx, err.user_message());
                    Ended::Failed
                }
            }
        };

        match ended {
            Ended::Shutdown => return,
            Ended::NotReady => {}
            Ended::Failed => {
                // Final unless readiness toggles false -> true.
                if session.wait_for(|s| !s.ready).await.is_err() {
                    return;
                }
                tx.send_modify(|feed| {
                    feed.loading = true;
                    feed.error = None;
                    feed.revision += 1;
                });
            }
        }
    }
}

async fn consume<T: CatalogItem>(
    mut stream: SnapshotStream,
    session: &mut watch::Receiver<SessionState>,
    tx: &watch::Sender<FeedState<T>>,
) -> Ended {
    loop {
        tokio::select! {
            event = stream.next() => match event {
                Some(Ok(documents)) => {
                    let items = sort_snapshot::<T>(&documents);
                    debug!(documents = documents.len(), items = items.len(), "Snapshot received");
                    tx.send_modify(|feed| {
                        feed.items = items;
                        feed.loading = false;
                        feed.error = None;
                        feed.revision += 1;
                    });
                }
                Some(Err(e)) => {
                    let err = ClientError::Subscription(e);
                    error!(error = %err, "Subscription failed");
                    publish_error(tx, err.user_message());
                    return Ended::Failed;
                }
                None => {
                    let err = ClientError::Subscription(crate::backend::BackendError::Unavailable(
                        "the live feed was closed".to_string(),
                    ));
                    error!(error = %err, "Subscription closed");
                    publish_error(tx, err.user_message());
                    return Ended::Failed;
                }
            },
            open = async { session.wait_for(|s| !s.ready).await.is_ok() } => {
                return if open {
                    info!("Session no longer ready, dropping subscription");
                    Ended::NotReady
                } else {
                    Ended::Shutdown
                };
            }
        }
    }
}

fn publish_error<T>(tx: &watch::Sender<FeedState<T>>, message: String) {
    tx.send_modify(|feed| {
        feed.loading = false;
        feed.error = Some(message);
        feed.revision += 1;
    });
}
