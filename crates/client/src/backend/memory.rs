//! In-process backend.
//!
//! Holds documents in memory and pushes a fresh full snapshot to every live
//! subscriber after each change. Used when the app runs on a placeholder
//! configuration, and by tests, which can script failures, hold a sign-in
//! open and count calls.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use serde_json::Value;
use storehub_core::{CollectionPath, Document, DocumentId, Fields, Identity, IdentityKind, UserId};
use tokio::sync::{Notify, mpsc, watch};
use tracing::{debug, instrument};

use super::{BackendError, CollectionService, IdentityService, NewDocument, SnapshotEvent, SnapshotStream};

type Subscriber = mpsc::UnboundedSender<SnapshotEvent>;

/// In-memory identity and collection service.
///
/// Cheaply cloneable; clones share the same state.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
    identity: watch::Sender<Option<Identity>>,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, BTreeMap<DocumentId, Fields>>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    sign_in_failure: Option<String>,
    subscribe_failure: Option<String>,
    write_failure: Option<String>,
    sign_in_gate: Option<Arc<Notify>>,
    sign_in_calls: usize,
    subscribe_calls: usize,
    create_calls: usize,
}

/// Releases a sign-in held by [`MemoryBackend::hold_sign_in`].
#[derive(Debug)]
pub struct SignInGate {
    notify: Arc<Notify>,
}

impl SignInGate {
    /// Let the pending (or next) sign-in complete.
    pub fn release(self) {
        self.notify.notify_one();
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            inner: Arc::new(Mutex::new(MemoryState::default())),
            identity,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Insert or replace a document and notify subscribers.
    pub fn put(&self, path: &CollectionPath, id: impl Into<DocumentId>, fields: Fields) {
        let mut state = self.state();
        state
            .collections
            .entry(path.to_string())
            .or_default()
            .insert(id.into(), fields);
        state.broadcast(path);
    }

    /// Remove a document and notify subscribers.
    pub fn remove(&self, path: &CollectionPath, id: &DocumentId) {
        let mut state = self.state();
        if let Some(docs) = state.collections.get_mut(&path.to_string()) {
            docs.remove(id);
        }
        state.broadcast(path);
    }

    /// Current documents of a collection, ordered by id.
    #[must_use]
    pub fn documents(&self, path: &CollectionPath) -> Vec<Document> {
        self.state().snapshot(path)
    }

    /// Make every following sign-in fail with a rejection carrying `message`.
    pub fn fail_sign_in(&self, message: impl Into<String>) {
        self.state().sign_in_failure = Some(message.into());
    }

    /// Make every following subscribe call fail with an access-policy rejection.
    pub fn fail_subscribe(&self, message: impl Into<String>) {
        self.state().subscribe_failure = Some(message.into());
    }

    /// Make every following create call fail with an access-policy rejection.
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.state().write_failure = Some(message.into());
    }

    /// Let writes succeed again.
    pub fn allow_writes(&self) {
        self.state().write_failure = None;
    }

    /// Push a terminal error to every live subscriber of `path`.
    pub fn break_subscriptions(&self, path: &CollectionPath, message: impl Into<String>) {
        let message = message.into();
        let mut state = self.state();
        if let Some(subscribers) = state.subscribers.remove(&path.to_string()) {
            for subscriber in subscribers {
                let _ = subscriber.send(Err(rejected(&message)));
            }
        }
    }

    /// Hold sign-in calls until the returned gate is released.
    #[must_use]
    pub fn hold_sign_in(&self) -> SignInGate {
        let notify = Arc::new(Notify::new());
        self.state().sign_in_gate = Some(notify.clone());
        SignInGate { notify }
    }

    /// Simulate the identity service signing the user out.
    pub fn sign_out(&self) {
        self.identity.send_replace(None);
    }

    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.state().sign_in_calls
    }

    #[must_use]
    pub fn subscribe_calls(&self) -> usize {
        self.state().subscribe_calls
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    /// Number of subscriptions whose receiver is still open.
    #[must_use]
    pub fn live_subscriptions(&self, path: &CollectionPath) -> usize {
        let mut state = self.state();
        let key = path.to_string();
        state.subscribers.get_mut(&key).map_or(0, |subs| {
            subs.retain(|s| !s.is_closed());
            subs.len()
        })
    }

    async fn sign_in(&self, kind: IdentityKind) -> Result<Identity, BackendError> {
        let gate = {
            let mut state = self.state();
            state.sign_in_calls += 1;
            state.sign_in_gate.take()
        };
        if let Some(gate) = gate {
            debug!("Sign-in held until released");
            gate.notified().await;
        }

        let failure = self.state().sign_in_failure.clone();
        if let Some(message) = failure {
            return Err(BackendError::Rejected {
                code: "ADMIN_ONLY_OPERATION".to_string(),
                message,
            });
        }

        let prefix = match kind {
            IdentityKind::CustomToken => "user",
            IdentityKind::Anonymous | IdentityKind::Placeholder => "anon",
        };
        let identity = Identity::new(
            UserId::new(format!("{prefix}-{}", uuid::Uuid::new_v4().simple())),
            kind,
        );
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }
}

impl MemoryState {
    fn snapshot(&self, path: &CollectionPath) -> Vec<Document> {
        self.collections
            .get(&path.to_string())
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn broadcast(&mut self, path: &CollectionPath) {
        let snapshot = self.snapshot(path);
        if let Some(subscribers) = self.subscribers.get_mut(&path.to_string()) {
            subscribers.retain(|s| s.send(Ok(snapshot.clone())).is_ok());
        }
    }
}

fn rejected(message: &str) -> BackendError {
    BackendError::Rejected {
        code: "PERMISSION_DENIED".to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl IdentityService for MemoryBackend {
    #[instrument(skip_all)]
    async fn sign_in_with_custom_token(
        &self,
        _token: &SecretString,
    ) -> Result<Identity, BackendError> {
        self.sign_in(IdentityKind::CustomToken).await
    }

    #[instrument(skip_all)]
    async fn sign_in_anonymously(&self) -> Result<Identity, BackendError> {
        self.sign_in(IdentityKind::Anonymous).await
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

#[async_trait]
impl CollectionService for MemoryBackend {
    #[instrument(skip(self), fields(path = %path))]
    async fn subscribe(&self, path: &CollectionPath) -> Result<SnapshotStream, BackendError> {
        let mut state = self.state();
        state.subscribe_calls += 1;
        if let Some(message) = state.subscribe_failure.clone() {
            return Err(rejected(&message));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(state.snapshot(path)));
        state
            .subscribers
            .entry(path.to_string())
            .or_default()
            .push(tx);
        Ok(SnapshotStream::new(rx, None))
    }

    #[instrument(skip(self, document), fields(path = %path, id = %document.id))]
    async fn create_document(
        &self,
        path: &CollectionPath,
        document: NewDocument,
    ) -> Result<DocumentId, BackendError> {
        let mut state = self.state();
        state.create_calls += 1;
        if let Some(message) = state.write_failure.clone() {
            return Err(rejected(&message));
        }

        let docs = state.collections.entry(path.to_string()).or_default();
        if docs.contains_key(&document.id) {
            debug!("Document already exists, treating create as done");
            return Ok(document.id);
        }

        let mut fields = document.fields;
        let now = Value::String(Utc::now().to_rfc3339());
        for field in document.server_timestamps {
            fields.insert(field.to_string(), now.clone());
        }
        docs.insert(document.id.clone(), fields);
        state.broadcast(path);
        Ok(document.id)
    }
}
