//! Store list handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State, response::IntoResponse};
use storehub_client::{FeedState, ViewState};
use storehub_core::Store;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Store display data for templates.
#[derive(Debug, Clone)]
pub struct StoreView {
    pub name: String,
    pub category: &'static str,
    pub description: String,
    pub rating: String,
    pub delivery_time: String,
}

impl From<&Store> for StoreView {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            category: store.category.label(),
            description: store.description.clone(),
            rating: format!("{:.1}", store.rating),
            delivery_time: format!("{} min", store.delivery_time),
        }
    }
}

/// Store list page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/index.html")]
pub struct StoresTemplate {
    pub error: Option<String>,
    pub loading: bool,
    pub stores: Vec<StoreView>,
}

impl StoresTemplate {
    fn from_feed(feed: &FeedState<Store>) -> Self {
        let (error, loading, stores) = match feed.view() {
            ViewState::Error(message) => (Some(message.to_string()), false, Vec::new()),
            ViewState::Loading => (None, true, Vec::new()),
            ViewState::Empty => (None, false, Vec::new()),
            ViewState::Populated(items) => (None, false, items.iter().map(StoreView::from).collect()),
        };
        Self {
            error,
            loading,
            stores,
        }
    }
}

/// Display the store list.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    StoresTemplate::from_feed(&state.stores())
}

/// Store feed as JSON.
///
/// # Errors
///
/// Returns 503 with the feed's error message once the feed has failed.
#[instrument(skip(state))]
pub async fn api(State(state): State<AppState>) -> Result<Json<FeedState<Store>>> {
    let feed = state.stores();
    if let Some(message) = feed.error {
        return Err(AppError::Unavailable(message));
    }
    Ok(Json(feed))
}
