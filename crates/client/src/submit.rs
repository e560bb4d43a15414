//! Product draft submission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use storehub_core::{CREATED_AT_FIELD, CatalogItem, CollectionPath, DocumentId, DraftProduct, Product};
use tracing::{info, instrument, warn};

use crate::backend::{CollectionService, NewDocument};
use crate::context::ClientContext;
use crate::error::{ClientError, WriteError};
use crate::session::SessionState;

/// Appends validated drafts to the products collection.
///
/// At most one submission runs at a time per submitter. Clones share the
/// in-flight flag, so one admin process serves a single operator: while any
/// draft is being written, every other submit gets [`WriteError::InFlight`].
/// A draft is written under its submission id, so resubmitting the same draft
/// after an ambiguous failure cannot create a second product.
#[derive(Clone)]
pub struct DraftSubmitter {
    collections: Arc<dyn CollectionService>,
    path: CollectionPath,
    read_only: bool,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for DraftSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSubmitter")
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DraftSubmitter {
    /// Submitter for the products collection of `ctx`.
    #[must_use]
    pub fn new(ctx: &ClientContext) -> Self {
        Self {
            collections: ctx.collections(),
            path: ctx.path(Product::KIND),
            read_only: ctx.is_placeholder(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a create call is currently outstanding.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the submit affordance should be enabled.
    #[must_use]
    pub fn can_submit(&self, session: &SessionState) -> bool {
        !self.read_only && session.can_write() && !self.is_submitting()
    }

    /// Validate and persist `draft`, resetting it on success.
    ///
    /// # Errors
    ///
    /// - [`WriteError::ReadOnly`] when writes are disabled
    /// - [`ClientError::Validation`] for an invalid draft; nothing is sent
    /// - [`WriteError::InFlight`] while another submission is outstanding
    /// - [`WriteError::Rejected`] when the backend refuses the write; the
    ///   draft is kept
    #[instrument(skip_all, fields(submission_id = %draft.submission_id))]
    pub async fn submit(
        &self,
        session: &SessionState,
        draft: &mut DraftProduct,
    ) -> Result<DocumentId, ClientError> {
        let creator = match &session.identity {
            Some(identity) if !self.read_only && session.can_write() => identity.uid.clone(),
            _ => {
                warn!("Submission refused in read-only mode");
                return Err(WriteError::ReadOnly.into());
            }
        };

        let valid = draft.validate()?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WriteError::InFlight.into());
        }
        let _guard = InFlight(&self.in_flight);

        let document = NewDocument {
            id: valid.submission_id.document_id(),
            fields: valid.into_fields(&creator),
            server_timestamps: vec![CREATED_AT_FIELD],
        };
        match self.collections.create_document(&self.path, document).await {
            Ok(id) => {
                info!(id = %id, "Product added");
                draft.reset();
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, "Product write rejected");
                Err(WriteError::Rejected(e).into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use storehub_core::{Identity, IdentityKind, TenantId, UserId, sort_snapshot};

    use super::*;
    use crate::backend::memory::MemoryBackend;

    fn context(backend: &MemoryBackend) -> ClientContext {
        ClientContext::from_services(
            TenantId::new("t1"),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            None,
            false,
        )
    }

    fn signed_in() -> SessionState {
        SessionState {
            identity: Some(Identity::new(UserId::new("u1"), IdentityKind::Anonymous)),
            ready: true,
            ..SessionState::default()
        }
    }

    fn draft(name: &str, price: &str) -> DraftProduct {
        DraftProduct {
            name: name.to_string(),
            description: "Loose leaf".to_string(),
            price: price.to_string(),
            ..DraftProduct::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_drafts_make_no_calls() {
        let backend = MemoryBackend::new();
        let submitter = DraftSubmitter::new(&context(&backend));
        for (name, price) in [("", "2.50"), ("   ", "2.50"), ("Tea", "0"), ("Tea", "-1"), ("Tea", "abc")] {
            let mut d = draft(name, price);
            let err = submitter.submit(&signed_in(), &mut d).await.unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)), "{name:?} {price:?}");
            assert_eq!(d.name, name);
        }
        assert_eq!(backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_valid_draft_is_written_once_and_reset() {
        let backend = MemoryBackend::new();
        let ctx = context(&backend);
        let submitter = DraftSubmitter::new(&ctx);
        let mut d = draft("  Green Tea ", "2.555");
        let submission = d.submission_id;

        let id = submitter.submit(&signed_in(), &mut d).await.unwrap();
        assert_eq!(id, submission.document_id());
        assert_eq!(backend.create_calls(), 1);
        assert!(d.is_blank());
        assert_ne!(d.submission_id, submission);

        let products: Vec<Product> =
            sort_snapshot(&backend.documents(&ctx.path(Product::KIND)));
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Green Tea");
        assert_eq!(products[0].price.to_string(), "2.56");
        assert_eq!(products[0].created_by, Some(UserId::new("u1")));
        assert!(products[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_rejected_write_keeps_draft() {
        let backend = MemoryBackend::new();
        backend.fail_writes("Missing or insufficient permissions.");
        let submitter = DraftSubmitter::new(&context(&backend));
        let mut d = draft("Tea", "3");
        let before = d.clone();

        let err = submitter.submit(&signed_in(), &mut d).await.unwrap_err();
        assert!(matches!(err, ClientError::Write(WriteError::Rejected(_))));
        assert!(err.user_message().contains("Missing or insufficient permissions."));
        assert_eq!(d, before);
        assert!(!submitter.is_submitting());
    }

    #[tokio::test]
    async fn test_resubmitting_same_draft_does_not_duplicate() {
        let backend = MemoryBackend::new();
        let ctx = context(&backend);
        let submitter = DraftSubmitter::new(&ctx);
        let original = draft("Tea", "3");

        let mut first = original.clone();
        let mut retry = original.clone();
        submitter.submit(&signed_in(), &mut first).await.unwrap();
        submitter.submit(&signed_in(), &mut retry).await.unwrap();

        assert_eq!(backend.create_calls(), 2);
        assert_eq!(backend.documents(&ctx.path(Product::KIND)).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_rejected() {
        let backend = MemoryBackend::new();
        let submitter = DraftSubmitter::new(&context(&backend));
        submitter.in_flight.store(true, Ordering::Release);
        assert!(!submitter.can_submit(&signed_in()));

        let mut d = draft("Tea", "3");
        let err = submitter.submit(&signed_in(), &mut d).await.unwrap_err();
        assert!(matches!(err, ClientError::Write(WriteError::InFlight)));
        assert_eq!(backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_the_in_flight_flag() {
        let backend = MemoryBackend::new();
        let submitter = DraftSubmitter::new(&context(&backend));
        let other = submitter.clone();
        submitter.in_flight.store(true, Ordering::Release);

        let mut d = draft("Oolong", "4");
        let err = other.submit(&signed_in(), &mut d).await.unwrap_err();
        assert!(matches!(err, ClientError::Write(WriteError::InFlight)));
        assert_eq!(d.name, "Oolong");

        submitter.in_flight.store(false, Ordering::Release);
        other.submit(&signed_in(), &mut d).await.unwrap();
        assert_eq!(backend.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_context_disables_writes() {
        let backend = MemoryBackend::new();
        let submitter = DraftSubmitter::new(&ClientContext::placeholder(TenantId::new("t1"), backend.clone()));
        let session = signed_in();
        assert!(!submitter.can_submit(&session));

        let mut d = draft("Tea", "3");
        let err = submitter.submit(&session, &mut d).await.unwrap_err();
        assert!(matches!(err, ClientError::Write(WriteError::ReadOnly)));
        assert_eq!(backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_placeholder_identity_disables_writes() {
        let backend = MemoryBackend::new();
        let submitter = DraftSubmitter::new(&context(&backend));
        let session = SessionState {
            identity: Some(Identity::placeholder()),
            ready: true,
            read_only: true,
            error: None,
        };
        assert!(!submitter.can_submit(&session));
        let mut d = draft("Tea", "3");
        assert!(submitter.submit(&session, &mut d).await.is_err());
        assert_eq!(backend.create_calls(), 0);
    }
}
