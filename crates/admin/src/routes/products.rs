//! Product list and product entry handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use storehub_client::{ClientError, FeedState, ViewState, WriteError};
use storehub_core::{DraftProduct, Product, ProductCategory, SubmissionId};
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub name: String,
    pub category: &'static str,
    pub description: String,
    pub price: String,
    /// `None` while the server timestamp is pending.
    pub created_at: Option<String>,
    pub created_by: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.label(),
            description: product.description.clone(),
            price: product.price_display(),
            created_at: product
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
            created_by: product.created_by.as_ref().map(ToString::to_string),
        }
    }
}

/// A category `<option>`.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub label: &'static str,
    pub selected: bool,
}

/// Product page: entry form above the live list.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub read_only_notice: Option<String>,
    pub can_submit: bool,
    pub submitting: bool,
    pub draft: DraftProduct,
    pub categories: Vec<CategoryOption>,
    pub form_error: Option<String>,
    pub success: Option<String>,
    pub feed_error: Option<String>,
    pub loading: bool,
    pub products: Vec<ProductView>,
}

impl ProductsTemplate {
    fn new(state: &AppState, draft: DraftProduct) -> Self {
        let session = state.session();
        let submitter = state.submitter();
        let (feed_error, loading, products) = list(&state.products());
        let categories = ProductCategory::ALL
            .iter()
            .map(|category| CategoryOption {
                label: category.label(),
                selected: *category == draft.category,
            })
            .collect();
        Self {
            read_only_notice: state.read_only_notice(),
            can_submit: submitter.can_submit(&session),
            submitting: submitter.is_submitting(),
            draft,
            categories,
            form_error: None,
            success: None,
            feed_error,
            loading,
            products,
        }
    }
}

fn list(feed: &FeedState<Product>) -> (Option<String>, bool, Vec<ProductView>) {
    match feed.view() {
        ViewState::Error(message) => (Some(message.to_string()), false, Vec::new()),
        ViewState::Loading => (None, true, Vec::new()),
        ViewState::Empty => (None, false, Vec::new()),
        ViewState::Populated(items) => (None, false, items.iter().map(ProductView::from).collect()),
    }
}

/// Posted product form.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub submission_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category: String,
}

impl ProductForm {
    fn into_draft(self) -> Result<DraftProduct> {
        let submission_id = SubmissionId::parse(self.submission_id.trim())
            .map_err(|e| AppError::BadRequest(format!("invalid submission id: {e}")))?;
        Ok(DraftProduct {
            submission_id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: ProductCategory::from_label(&self.category),
        })
    }
}

/// Display the product form and list.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    ProductsTemplate::new(&state, DraftProduct::default())
}

/// Submit a product draft.
///
/// Validation and backend failures re-render the form with the draft kept;
/// success renders a fresh draft.
///
/// # Errors
///
/// Returns 400 for a malformed submission id and 403 in read-only mode.
#[instrument(skip(state, form), fields(submission_id = %form.submission_id))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<impl IntoResponse> {
    let mut draft = form.into_draft()?;
    let session = state.session();

    match state.submitter().submit(&session, &mut draft).await {
        Ok(id) => {
            info!(id = %id, "Product submitted");
            let mut page = ProductsTemplate::new(&state, draft);
            page.success = Some("Product added.".to_string());
            Ok(page)
        }
        Err(e @ ClientError::Write(WriteError::ReadOnly)) => {
            Err(AppError::Forbidden(e.user_message()))
        }
        Err(e) => {
            let mut page = ProductsTemplate::new(&state, draft);
            page.form_error = Some(e.user_message());
            Ok(page)
        }
    }
}

/// Product feed as JSON.
///
/// # Errors
///
/// Returns 503 with the feed's error message once the feed has failed.
#[instrument(skip(state))]
pub async fn api(State(state): State<AppState>) -> Result<Json<FeedState<Product>>> {
    let feed = state.products();
    if let Some(message) = feed.error {
        return Err(AppError::Unavailable(message));
    }
    Ok(Json(feed))
}
