//! Storefront scenarios: startup ordering, snapshot rendering and failures.
//!
//! Run with: cargo test -p storehub-integration-tests --test storefront_flow

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use storehub_client::backend::memory::MemoryBackend;
use storehub_client::{AuthFallback, BackendConfig, ClientContext, LiveFeed, Session};
use storehub_core::{CollectionKind, DocumentId, IdentityKind, Store, TenantId};
use storehub_integration_tests::{TENANT, fields, get, memory_context, send, tenant_path};
use storehub_storefront::{app, state::AppState};

// ============================================================================
// Startup ordering
// ============================================================================

#[tokio::test]
async fn test_subscription_waits_for_sign_in() {
    let backend = MemoryBackend::new();
    let gate = backend.hold_sign_in();
    let state = AppState::with_context(&memory_context(&backend));

    // Give the session and feed tasks every chance to run ahead.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(backend.sign_in_calls(), 1);
    assert_eq!(backend.subscribe_calls(), 0);
    assert!(!state.session().ready);
    assert!(state.stores().loading);

    gate.release();
    let feed = state.stores_settled().await;
    assert!(!feed.loading);
    assert_eq!(backend.subscribe_calls(), 1);
}

#[tokio::test]
async fn test_failed_sign_in_never_subscribes() {
    let backend = MemoryBackend::new();
    backend.fail_sign_in("anonymous sign-in is disabled");
    let state = AppState::with_context(&memory_context(&backend));

    let feed = state.stores_settled().await;
    assert!(!feed.loading);
    assert!(feed.error.unwrap().contains("anonymous sign-in is disabled"));
    assert_eq!(backend.subscribe_calls(), 0);

    let page = send(app(state), get("/")).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Something went wrong."));
    assert!(page.body.contains("Sign-in failed"));
}

#[tokio::test]
async fn test_credential_token_is_redeemed() {
    let backend = MemoryBackend::new();
    let ctx = ClientContext::from_services(
        TenantId::new(TENANT),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Some(SecretString::from("one-time-token")),
        false,
    );
    let state = AppState::with_context(&ctx);
    state.stores_settled().await;

    let identity = state.session().identity.unwrap();
    assert_eq!(identity.kind, IdentityKind::CustomToken);
    assert_eq!(backend.sign_in_calls(), 1);
}

// ============================================================================
// Snapshot rendering
// ============================================================================

#[tokio::test]
async fn test_anonymous_tenant_scenario() {
    let backend = MemoryBackend::new();
    let path = tenant_path(CollectionKind::Stores);
    backend.put(
        &path,
        "s1",
        fields(json!({"name": "Zeta Mart", "rating": 4.0, "deliveryTime": 30})),
    );
    backend.put(
        &path,
        "s2",
        fields(json!({"name": "Alpha Deli", "rating": 4.5, "deliveryTime": 20})),
    );
    let state = AppState::with_context(&memory_context(&backend));

    let feed = state.stores_settled().await;
    assert!(!feed.loading);
    assert!(feed.error.is_none());
    let names: Vec<&str> = feed.items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Alpha Deli", "Zeta Mart"]);
    assert_eq!(
        state.session().identity.unwrap().kind,
        IdentityKind::Anonymous
    );

    let page = send(app(state.clone()), get("/")).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.position("Alpha Deli") < page.position("Zeta Mart"));
    assert!(page.body.contains("4.5"));
    assert!(page.body.contains("30 min"));

    let api = send(app(state), get("/api/stores")).await;
    let json = api.json();
    assert_eq!(json["loading"], false);
    assert_eq!(json["error"], serde_json::Value::Null);
    assert_eq!(json["items"][0]["name"], "Alpha Deli");
    assert_eq!(json["items"][1]["deliveryTime"], 30);
}

#[tokio::test]
async fn test_each_snapshot_replaces_the_list() {
    let backend = MemoryBackend::new();
    let ctx = memory_context(&backend);
    let path = ctx.path(CollectionKind::Stores);
    let session = Session::start(&ctx, AuthFallback::FailFast);
    let feed: LiveFeed<Store> = LiveFeed::spawn(ctx.collections(), ctx.tenant_id().clone(), session.watch());
    let mut rx = feed.watch();
    feed.settled().await;

    // Arrival order differs from display order.
    backend.put(&path, "c", fields(json!({"name": "Corner Shop"})));
    backend.put(&path, "a", fields(json!({"name": "Bakery"})));
    backend.put(&path, "b", fields(json!({"name": "Bakery"})));
    backend.remove(&path, &DocumentId::new("c"));

    let state = rx
        .wait_for(|s| s.items.len() == 2 && s.items.iter().all(|i| i.name == "Bakery"))
        .await
        .unwrap()
        .clone();
    let ids: Vec<&str> = state.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert!(!state.loading);
    assert!(state.revision >= 2);
}

#[tokio::test]
async fn test_empty_collection_renders_empty_state() {
    let state = AppState::with_context(&memory_context(&MemoryBackend::new()));
    let feed = state.stores_settled().await;
    assert!(feed.items.is_empty());
    assert!(!feed.loading);

    let page = send(app(state), get("/")).await;
    assert!(page.body.contains("No stores yet."));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_stream_error_is_final() {
    let backend = MemoryBackend::new();
    let path = tenant_path(CollectionKind::Stores);
    backend.put(&path, "s1", fields(json!({"name": "Alpha Deli"})));
    let state = AppState::with_context(&memory_context(&backend));
    state.stores_settled().await;

    backend.break_subscriptions(&path, "Missing or insufficient permissions.");
    let failed = {
        let mut attempts = 0;
        loop {
            let feed = state.stores();
            if feed.error.is_some() || attempts > 100 {
                break feed;
            }
            attempts += 1;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    assert!(failed.error.as_deref().unwrap().contains("access policy"));
    assert!(!failed.loading);

    backend.put(&path, "s2", fields(json!({"name": "Zeta Mart"})));
    tokio::time::sleep(Duration::from_millis(20)).await;
    let after = state.stores();
    assert_eq!(after.revision, failed.revision);
    assert_eq!(after.error, failed.error);

    let api = send(app(state.clone()), get("/api/stores")).await;
    assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);

    let page = send(app(state), get("/")).await;
    assert!(page.body.contains("Something went wrong."));
    assert!(!page.body.contains("Zeta Mart"));
}

#[tokio::test]
async fn test_placeholder_configuration_fails_fast() {
    let config = BackendConfig::placeholder(TenantId::new(TENANT), "STOREHUB_API_KEY is not set");
    let state = AppState::start(Ok(config));

    let feed = state.stores_settled().await;
    assert!(!feed.loading);
    assert!(feed.error.unwrap().contains("STOREHUB_API_KEY is not set"));

    let page = send(app(state.clone()), get("/")).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("STOREHUB_API_KEY is not set"));

    let health = send(app(state), get("/health")).await;
    assert_eq!(health.status, StatusCode::OK);
}
