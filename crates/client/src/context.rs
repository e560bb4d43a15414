//! The explicit client context owned by each app root.

use std::sync::Arc;

use secrecy::SecretString;
use storehub_core::{CollectionKind, CollectionPath, TenantId};

use crate::backend::hosted::HostedBackend;
use crate::backend::memory::MemoryBackend;
use crate::backend::{CollectionService, IdentityService};
use crate::config::{BackendConfig, BackendMode, ConfigError};
use crate::error::ClientError;

/// Connection handles and tenant scope for one app instance.
///
/// Built once at startup and passed to every component that talks to the
/// backend. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ClientContext {
    inner: Arc<ClientContextInner>,
}

struct ClientContextInner {
    tenant_id: TenantId,
    identity: Arc<dyn IdentityService>,
    collections: Arc<dyn CollectionService>,
    auth_token: Option<SecretString>,
    placeholder: bool,
}

impl ClientContext {
    /// Connect to the hosted backend.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] when the configuration is a
    /// placeholder or its endpoints are invalid.
    pub fn connect(config: &BackendConfig) -> Result<Self, ClientError> {
        let hosted = match &config.mode {
            BackendMode::Hosted(hosted) => hosted,
            BackendMode::Placeholder { reason } => {
                return Err(ConfigError::PlaceholderCredentials(reason.clone()).into());
            }
        };
        let backend = HostedBackend::new(hosted)?;
        tracing::info!(tenant = %config.tenant_id, project = %hosted.project_id, "Connected to hosted backend");
        Ok(Self::from_services(
            config.tenant_id.clone(),
            Arc::new(backend.clone()),
            Arc::new(backend),
            config.auth_token.clone(),
            false,
        ))
    }

    /// Connect to the hosted backend, or fall back to an in-memory backend in
    /// read-only mode when the configuration is a placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] when hosted endpoints are invalid.
    pub fn connect_or_placeholder(config: &BackendConfig) -> Result<Self, ClientError> {
        if config.mode.is_placeholder() {
            tracing::warn!(tenant = %config.tenant_id, "Running on placeholder backend, writes disabled");
            return Ok(Self::placeholder(config.tenant_id.clone(), MemoryBackend::new()));
        }
        Self::connect(config)
    }

    /// A read-only context over an in-memory backend.
    #[must_use]
    pub fn placeholder(tenant_id: TenantId, backend: MemoryBackend) -> Self {
        Self::from_services(
            tenant_id,
            Arc::new(backend.clone()),
            Arc::new(backend),
            None,
            true,
        )
    }

    /// Assemble a context from explicit services.
    #[must_use]
    pub fn from_services(
        tenant_id: TenantId,
        identity: Arc<dyn IdentityService>,
        collections: Arc<dyn CollectionService>,
        auth_token: Option<SecretString>,
        placeholder: bool,
    ) -> Self {
        Self {
            inner: Arc::new(ClientContextInner {
                tenant_id,
                identity,
                collections,
                auth_token,
                placeholder,
            }),
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.inner.tenant_id
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn IdentityService> {
        self.inner.identity.clone()
    }

    #[must_use]
    pub fn collections(&self) -> Arc<dyn CollectionService> {
        self.inner.collections.clone()
    }

    #[must_use]
    pub fn auth_token(&self) -> Option<&SecretString> {
        self.inner.auth_token.as_ref()
    }

    /// Whether this context runs against a placeholder configuration.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.inner.placeholder
    }

    /// Path of one of the tenant's public collections.
    #[must_use]
    pub fn path(&self, kind: CollectionKind) -> CollectionPath {
        CollectionPath::new(self.inner.tenant_id.clone(), kind)
    }
}
