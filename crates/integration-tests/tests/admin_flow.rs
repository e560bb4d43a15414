//! Admin panel scenarios: product entry, validation, idempotency and the
//! read-only fallback.
//!
//! Run with: cargo test -p storehub-integration-tests --test admin_flow

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::StatusCode;
use storehub_admin::{app, state::AppState};
use storehub_client::backend::memory::MemoryBackend;
use storehub_client::{BackendConfig, ClientContext, ConfigError};
use storehub_core::{CollectionKind, IdentityKind, SubmissionId, TenantId};
use storehub_integration_tests::{Page, TENANT, get, memory_context, post_form, send, tenant_path};

/// Post the product form with a fresh or given submission id.
async fn submit(
    state: &AppState,
    submission_id: SubmissionId,
    name: &str,
    price: &str,
) -> Page {
    let id = submission_id.to_string();
    send(
        app(state.clone()),
        post_form(
            "/products",
            &[
                ("submission_id", id.as_str()),
                ("name", name),
                ("description", "Loose leaf"),
                ("price", price),
                ("category", "Beverage"),
            ],
        ),
    )
    .await
}

/// Poll the product feed until it holds `count` items.
async fn wait_for_products(state: &AppState, count: usize) {
    for _ in 0..200 {
        if state.products().items.len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("product feed never reached {count} items");
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_invalid_drafts_never_reach_the_backend() {
    let backend = MemoryBackend::new();
    let state = AppState::with_context(&memory_context(&backend), None);
    state.products_settled().await;

    for (name, price, message) in [
        ("", "3.00", "Product name is required"),
        ("   ", "3.00", "Product name is required"),
        ("Tea", "0", "Price is invalid"),
        ("Tea", "-2", "Price is invalid"),
        ("Tea", "abc", "Price is invalid"),
        ("Tea", "", "Price is invalid"),
    ] {
        let page = submit(&state, SubmissionId::generate(), name, price).await;
        assert_eq!(page.status, StatusCode::OK, "{name:?} / {price:?}");
        assert!(page.body.contains(message), "{name:?} / {price:?}");
    }

    assert_eq!(backend.create_calls(), 0);
    assert!(state.products().items.is_empty());
}

#[tokio::test]
async fn test_valid_draft_creates_one_product_and_resets() {
    let backend = MemoryBackend::new();
    let ctx = memory_context(&backend);
    let state = AppState::with_context(&ctx, None);
    state.products_settled().await;

    let id = SubmissionId::generate();
    let page = submit(&state, id, "Green Tea", "2.555").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Product added."));
    assert!(page.body.contains(r#"name="name" value="""#));
    assert!(!page.body.contains(&id.to_string()));
    assert_eq!(backend.create_calls(), 1);

    wait_for_products(&state, 1).await;
    let product = state.products().items.into_iter().next().unwrap();
    assert_eq!(product.name, "Green Tea");
    assert_eq!(product.price_display(), "$2.56");
    assert_eq!(product.id, id.document_id());
    assert!(product.created_at.is_some());
    assert_eq!(
        product.created_by.as_ref(),
        state.session().identity.as_ref().map(|i| &i.uid)
    );

    let listing = send(app(state), get("/")).await;
    assert!(listing.body.contains("Green Tea"));
    assert!(listing.body.contains("$2.56"));
}

#[tokio::test]
async fn test_resubmitting_a_draft_is_idempotent() {
    let backend = MemoryBackend::new();
    let state = AppState::with_context(&memory_context(&backend), None);
    state.products_settled().await;

    let id = SubmissionId::generate();
    submit(&state, id, "Green Tea", "3").await;
    let again = submit(&state, id, "Green Tea", "3").await;
    assert_eq!(again.status, StatusCode::OK);

    assert_eq!(backend.create_calls(), 2);
    assert_eq!(backend.documents(&tenant_path(CollectionKind::Products)).len(), 1);
}

#[tokio::test]
async fn test_rejected_write_keeps_draft_for_retry() {
    let backend = MemoryBackend::new();
    backend.fail_writes("Missing or insufficient permissions.");
    let state = AppState::with_context(&memory_context(&backend), None);
    state.products_settled().await;

    let id = SubmissionId::generate();
    let failed = submit(&state, id, "Green Tea", "3").await;
    assert!(failed.body.contains("Failed to add product"));
    assert!(failed.body.contains(&id.to_string()));
    assert!(failed.body.contains(r#"value="Green Tea""#));

    backend.allow_writes();
    let retried = submit(&state, id, "Green Tea", "3").await;
    assert!(retried.body.contains("Product added."));
    assert_eq!(backend.create_calls(), 2);

    wait_for_products(&state, 1).await;
    assert_eq!(state.products().items[0].id, id.document_id());
}

#[tokio::test]
async fn test_newest_products_listed_first() {
    let backend = MemoryBackend::new();
    let state = AppState::with_context(&memory_context(&backend), None);
    state.products_settled().await;

    submit(&state, SubmissionId::generate(), "First", "1").await;
    wait_for_products(&state, 1).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    submit(&state, SubmissionId::generate(), "Second", "2").await;
    wait_for_products(&state, 2).await;

    let names: Vec<String> = state.products().items.into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["Second", "First"]);
}

// ============================================================================
// Read-only fallback
// ============================================================================

#[tokio::test]
async fn test_placeholder_configuration_disables_submission() {
    let config = BackendConfig::placeholder(TenantId::new(TENANT), "STOREHUB_API_KEY is not set");
    let state = AppState::start(Ok(config));
    state.products_settled().await;

    let session = state.session();
    assert!(session.read_only);
    assert!(!state.submitter().can_submit(&session));

    let page = send(app(state.clone()), get("/")).await;
    assert!(page.body.contains("<fieldset disabled>"));
    assert!(page.body.contains("STOREHUB_API_KEY is not set"));

    let rejected = submit(&state, SubmissionId::generate(), "Green Tea", "3").await;
    assert_eq!(rejected.status, StatusCode::FORBIDDEN);

    let api = send(app(state), get("/api/products")).await;
    assert_eq!(api.json()["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_placeholder_backend_never_writes() {
    let backend = MemoryBackend::new();
    let ctx = ClientContext::placeholder(TenantId::new(TENANT), backend.clone());
    let state = AppState::with_context(&ctx, Some("Demo mode".to_string()));
    state.products_settled().await;

    for _ in 0..3 {
        let page = submit(&state, SubmissionId::generate(), "Green Tea", "3").await;
        assert_eq!(page.status, StatusCode::FORBIDDEN);
    }
    assert_eq!(backend.create_calls(), 0);
}

#[tokio::test]
async fn test_invalid_configuration_falls_back_to_read_only() {
    let state = AppState::start(Err(ConfigError::InvalidEnvVar(
        "STOREHUB_POLL_INTERVAL_MS".to_string(),
        "must be a number".to_string(),
    )));
    state.products_settled().await;

    let notice = state.read_only_notice().unwrap();
    assert!(notice.contains("STOREHUB_POLL_INTERVAL_MS"));
    assert!(!state.submitter().can_submit(&state.session()));
}

#[tokio::test]
async fn test_failed_sign_in_uses_placeholder_identity() {
    let backend = MemoryBackend::new();
    backend.fail_sign_in("anonymous sign-in is disabled");
    let state = AppState::with_context(&memory_context(&backend), None);

    let session = state.session_ready().await;
    assert!(session.ready);
    assert!(session.read_only);
    assert_eq!(session.identity.unwrap().kind, IdentityKind::Placeholder);

    let notice = state.read_only_notice().unwrap();
    assert!(notice.contains("anonymous sign-in is disabled"));

    let page = send(app(state.clone()), get("/")).await;
    assert!(page.body.contains("<fieldset disabled>"));

    let rejected = submit(&state, SubmissionId::generate(), "Green Tea", "3").await;
    assert_eq!(rejected.status, StatusCode::FORBIDDEN);
    assert_eq!(backend.create_calls(), 0);
}
