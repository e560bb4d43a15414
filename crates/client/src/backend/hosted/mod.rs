//! REST client for the hosted identity and document services.
//!
//! # Endpoints
//!
//! - `POST {identity}/accounts:signInWithCustomToken?key=…` - redeem a token
//! - `POST {identity}/accounts:signUp?key=…` - anonymous identity
//! - `GET  {documents}/projects/{p}/databases/(default)/documents/{path}` - list
//! - `POST {documents}/projects/{p}/databases/(default)/documents:commit` - create
//!
//! The document service has no REST streaming endpoint, so a subscription is
//! a polling task that lists the collection every `poll_interval` and emits a
//! snapshot whenever the document set differs from the previous one.

mod auth;
mod values;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use storehub_core::{CollectionPath, Document, DocumentId, Identity, IdentityKind, UserId};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{BackendError, CollectionService, IdentityService, NewDocument, SnapshotEvent, SnapshotStream};
use crate::config::{ConfigError, HostedConfig};
use auth::{AnonymousSignUpRequest, CustomTokenRequest, ErrorEnvelope, SignInResponse};

const PAGE_SIZE: &str = "300";

/// Hosted backend client.
///
/// Cheaply cloneable via `Arc`; clones share the signed-in ID token.
#[derive(Clone)]
pub struct HostedBackend {
    inner: Arc<HostedInner>,
}

struct HostedInner {
    client: reqwest::Client,
    custom_token_url: Url,
    sign_up_url: Url,
    /// `{documents}/projects/{p}/databases/(default)/documents`
    documents_root: String,
    /// `projects/{p}/databases/(default)/documents`
    resource_root: String,
    poll_interval: Duration,
    id_token: RwLock<Option<SecretString>>,
    identity: watch::Sender<Option<Identity>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

impl HostedBackend {
    /// Create a new hosted backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URLs cannot form endpoint URLs.
    pub fn new(config: &HostedConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key.expose_secret();
        let identity_base = config.identity_url.as_str().trim_end_matches('/');
        let custom_token_url = keyed_url(
            &format!("{identity_base}/accounts:signInWithCustomToken"),
            api_key,
        )?;
        let sign_up_url = keyed_url(&format!("{identity_base}/accounts:signUp"), api_key)?;

        let resource_root = format!(
            "projects/{}/databases/(default)/documents",
            config.project_id
        );
        let documents_root = format!(
            "{}/{resource_root}",
            config.documents_url.as_str().trim_end_matches('/')
        );

        let (identity, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(HostedInner {
                client: reqwest::Client::new(),
                custom_token_url,
                sign_up_url,
                documents_root,
                resource_root,
                poll_interval: config.poll_interval,
                id_token: RwLock::new(None),
                identity,
            }),
        })
    }

    fn bearer(&self) -> Option<String> {
        self.inner
            .id_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }

    /// Send a JSON POST and parse the JSON answer, mapping error envelopes.
    async fn post_json<B: serde::Serialize + Sync, R: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        authorized: bool,
    ) -> Result<R, BackendError> {
        let mut request = self.inner.client.post(url).json(body);
        if authorized && let Some(bearer) = self.bearer() {
            request = request.header("Authorization", bearer);
        }
        let response = request.send().await?;
        read_json(response).await
    }

    fn complete_sign_in(
        &self,
        response: SignInResponse,
        kind: IdentityKind,
    ) -> Result<Identity, BackendError> {
        let uid = response.uid().ok_or_else(|| BackendError::Rejected {
            code: "INVALID_ID_TOKEN".to_string(),
            message: "sign-in response carried no user id".to_string(),
        })?;
        // TODO: refresh the ID token through the secure token endpoint before its one-hour expiry.
        if response.refresh_token.is_none() {
            debug!("Sign-in response carried no refresh token");
        }
        *self
            .inner
            .id_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(SecretString::from(response.id_token));

        let identity = Identity::new(UserId::new(uid), kind);
        info!(uid = %identity.uid, kind = ?identity.kind, "Signed in");
        self.inner.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// List every document of a collection, following pagination.
    #[instrument(skip(self), fields(path = %path))]
    async fn list_documents(&self, path: &CollectionPath) -> Result<Vec<Document>, BackendError> {
        let base = format!("{}/{path}", self.inner.documents_root);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = Url::parse(&base).map_err(|e| BackendError::Unavailable(e.to_string()))?;
            url.query_pairs_mut().append_pair("pageSize", PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let mut request = self.inner.client.get(url);
            if let Some(bearer) = self.bearer() {
                request = request.header("Authorization", bearer);
            }
            let page: ListResponse = read_json(request.send().await?).await?;

            documents.extend(page.documents.into_iter().map(|doc| {
                let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
                Document::new(DocumentId::new(id), values::decode_fields(&doc.fields))
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }
}

#[async_trait]
impl IdentityService for HostedBackend {
    #[instrument(skip_all)]
    async fn sign_in_with_custom_token(
        &self,
        token: &SecretString,
    ) -> Result<Identity, BackendError> {
        let body = CustomTokenRequest {
            token: token.expose_secret(),
            return_secure_token: true,
        };
        let response: SignInResponse = self
            .post_json(self.inner.custom_token_url.as_str(), &body, false)
            .await?;
        self.complete_sign_in(response, IdentityKind::CustomToken)
    }

    #[instrument(skip_all)]
    async fn sign_in_anonymously(&self) -> Result<Identity, BackendError> {
        let body = AnonymousSignUpRequest {
            return_secure_token: true,
        };
        let response: SignInResponse = self
            .post_json(self.inner.sign_up_url.as_str(), &body, false)
            .await?;
        self.complete_sign_in(response, IdentityKind::Anonymous)
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.identity.subscribe()
    }
}

#[async_trait]
impl CollectionService for HostedBackend {
    #[instrument(skip(self), fields(path = %path))]
    async fn subscribe(&self, path: &CollectionPath) -> Result<SnapshotStream, BackendError> {
        // Fail the subscribe call itself when the first read is rejected.
        let initial = self.list_documents(path).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(initial.clone()));

        let backend = self.clone();
        let path = path.clone();
        let interval = self.inner.poll_interval;
        let producer = tokio::spawn(async move {
            poll_collection(backend, path, interval, tx, initial).await;
        });

        Ok(SnapshotStream::new(rx, Some(producer.abort_handle())))
    }

    #[instrument(skip(self, document), fields(path = %path, id = %document.id))]
    async fn create_document(
        &self,
        path: &CollectionPath,
        document: NewDocument,
    ) -> Result<DocumentId, BackendError> {
        let name = format!("{}/{path}/{}", self.inner.resource_root, document.id);
        let transforms: Vec<Value> = document
            .server_timestamps
            .iter()
            .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
            .collect();
        let body = json!({
            "writes": [{
                "update": { "name": name, "fields": values::encode_fields(&document.fields) },
                "updateTransforms": transforms,
                "currentDocument": { "exists": false },
            }]
        });
        let url = format!("{}:commit", self.inner.documents_root);

        match self.post_json::<_, Value>(&url, &body, true).await {
            Ok(_) => {
                info!("Document created");
                Ok(document.id)
            }
            Err(BackendError::Rejected { code, .. }) if code == "ALREADY_EXISTS" => {
                info!("Document already exists, treating create as done");
                Ok(document.id)
            }
            Err(e) => Err(e),
        }
    }
}

/// Re-list a collection until the subscriber goes away or a read fails.
async fn poll_collection(
    backend: HostedBackend,
    path: CollectionPath,
    interval: Duration,
    tx: mpsc::UnboundedSender<SnapshotEvent>,
    mut last: Vec<Document>,
) {
    loop {
        tokio::select! {
            () = tx.closed() => {
                debug!(%path, "Subscriber gone, stopping poller");
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }

        match backend.list_documents(&path).await {
            Ok(documents) if documents == last => {}
            Ok(documents) => {
                if tx.send(Ok(documents.clone())).is_err() {
                    return;
                }
                last = documents;
            }
            Err(e) => {
                warn!(%path, error = %e, "Live feed read failed");
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

fn keyed_url(base: &str, api_key: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(base)
        .map_err(|e| ConfigError::InvalidEnvVar("STOREHUB_IDENTITY_URL".to_string(), e.to_string()))?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// Parse a JSON response, turning non-success statuses into `Rejected`.
async fn read_json<R: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<R, BackendError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => (
                envelope
                    .error
                    .status
                    .unwrap_or_else(|| status.as_u16().to_string()),
                envelope.error.message,
            ),
            Err(_) => (
                status.as_u16().to_string(),
                text.chars().take(200).collect(),
            ),
        };
        warn!(%status, %code, %message, "Backend returned non-success status");
        return Err(BackendError::Rejected { code, message });
    }

    serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, body = %text.chars().take(500).collect::<String>(), "Failed to parse backend response");
        BackendError::Parse(e)
    })
}
