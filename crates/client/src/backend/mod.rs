//! Identity and collection service seams.
//!
//! # Implementations
//!
//! - [`hosted::HostedBackend`] - REST client for the hosted identity and
//!   document services; the live feed is emulated by polling
//! - [`memory::MemoryBackend`] - In-process backend used in placeholder mode
//!   and in tests
//!
//! Both implement [`IdentityService`] and [`CollectionService`]. Apps only
//! see the traits, through [`crate::ClientContext`].

pub mod hosted;
pub mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use storehub_core::{CollectionPath, Document, DocumentId, Fields, Identity};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};

/// Errors returned by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status (e.g. `PERMISSION_DENIED`).
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service cannot be reached or closed the feed.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// The usual access-policy rejection.
    #[must_use]
    pub fn permission_denied() -> Self {
        Self::Rejected {
            code: "PERMISSION_DENIED".to_string(),
            message: "Missing or insufficient permissions.".to_string(),
        }
    }
}

/// One event of a live subscription: a full snapshot or a terminal error.
pub type SnapshotEvent = Result<Vec<Document>, BackendError>;

/// Receiving end of a live subscription.
///
/// Dropping the stream cancels the subscription: the backend notices the
/// closed channel, and any producer task is aborted.
#[derive(Debug)]
pub struct SnapshotStream {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    producer: Option<AbortHandle>,
}

impl SnapshotStream {
    #[must_use]
    pub const fn new(
        events: mpsc::UnboundedReceiver<SnapshotEvent>,
        producer: Option<AbortHandle>,
    ) -> Self {
        Self { events, producer }
    }

    /// Wait for the next event. `None` means the backend closed the feed.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        self.events.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

/// A document to append to a collection.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Client-chosen id. A second create with the same id resolves to the
    /// existing document instead of duplicating it.
    pub id: DocumentId,
    pub fields: Fields,
    /// Fields the backend fills with its own clock at write time.
    pub server_timestamps: Vec<&'static str>,
}

/// Authentication against the identity service.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Redeem a one-time credential token.
    async fn sign_in_with_custom_token(
        &self,
        token: &SecretString,
    ) -> Result<Identity, BackendError>;

    /// Obtain an anonymous identity.
    async fn sign_in_anonymously(&self) -> Result<Identity, BackendError>;

    /// Register for identity changes. The current value is the latest
    /// identity; dropping the receiver deregisters.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;
}

/// Access to tenant-scoped collections.
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// Open a standing subscription delivering full snapshots.
    async fn subscribe(&self, path: &CollectionPath) -> Result<SnapshotStream, BackendError>;

    /// Append a document and return its id.
    async fn create_document(
        &self,
        path: &CollectionPath,
        document: NewDocument,
    ) -> Result<DocumentId, BackendError>;
}

/// Owns a background listener task and aborts it when dropped.
#[derive(Debug)]
pub struct ListenerGuard {
    task: JoinHandle<()>,
}

impl ListenerGuard {
    #[must_use]
    pub const fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
