//! Catalog items rendered from live snapshots.
//!
//! A snapshot is always rendered as a whole: decode every document, drop the
//! ones that cannot be decoded, then sort with the item's display order. There
//! is no incremental merge, so the result depends only on the snapshot.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::document::{DecodeError, Document};
use super::id::{DocumentId, UserId};
use super::path::CollectionKind;

/// Store categories shown in the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StoreCategory {
    Bakery,
    Cafe,
    Grocery,
    Restaurant,
    Pharmacy,
    #[default]
    Other,
}

impl StoreCategory {
    pub const ALL: [Self; 6] = [
        Self::Bakery,
        Self::Cafe,
        Self::Grocery,
        Self::Restaurant,
        Self::Pharmacy,
        Self::Other,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bakery => "Bakery",
            Self::Cafe => "Cafe",
            Self::Grocery => "Grocery",
            Self::Restaurant => "Restaurant",
            Self::Pharmacy => "Pharmacy",
            Self::Other => "Other",
        }
    }

    /// Map a stored label to a category. Unknown labels become `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }
}

/// Product categories offered by the admin form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductCategory {
    Food,
    Beverage,
    Household,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[default]
    Other,
}

impl ProductCategory {
    pub const ALL: [Self; 5] = [
        Self::Food,
        Self::Beverage,
        Self::Household,
        Self::PersonalCare,
        Self::Other,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Beverage => "Beverage",
            Self::Household => "Household",
            Self::PersonalCare => "Personal Care",
            Self::Other => "Other",
        }
    }

    /// Map a stored label to a category. Unknown labels become `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }
}

/// An item type that can be rendered from a snapshot.
pub trait CatalogItem: Sized + Clone + Send + Sync + 'static {
    /// The collection this item lives in.
    const KIND: CollectionKind;

    /// Decode one snapshot document.
    ///
    /// # Errors
    ///
    /// Returns an error if a field has an incompatible type.
    fn from_document(document: &Document) -> Result<Self, DecodeError>;

    /// Total display order used when rendering a snapshot.
    fn display_order(&self, other: &Self) -> Ordering;
}

/// Decode and sort a full snapshot.
///
/// Documents that fail to decode are skipped with a warning.
#[must_use]
pub fn sort_snapshot<T: CatalogItem>(documents: &[Document]) -> Vec<T> {
    let mut items: Vec<T> = documents
        .iter()
        .filter_map(|doc| match T::from_document(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable document");
                None
            }
        })
        .collect();
    items.sort_by(T::display_order);
    items
}

// =============================================================================
// Store
// =============================================================================

/// A store listed in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: DocumentId,
    pub name: String,
    pub category: StoreCategory,
    pub description: String,
    pub rating: f64,
    /// Typical delivery time in minutes.
    pub delivery_time: u32,
}

impl CatalogItem for Store {
    const KIND: CollectionKind = CollectionKind::Stores;

    fn from_document(document: &Document) -> Result<Self, DecodeError> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to u32 range
        let delivery_time = document
            .number("deliveryTime")?
            .round()
            .clamp(0.0, f64::from(u32::MAX)) as u32;
        Ok(Self {
            id: document.id.clone(),
            name: document.text("name")?,
            category: StoreCategory::from_label(&document.text("category")?),
            description: document.text("description")?,
            rating: document.number("rating")?,
            delivery_time,
        })
    }

    /// Name ascending, then id.
    fn display_order(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product listed in the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: DocumentId,
    pub name: String,
    pub category: ProductCategory,
    pub description: String,
    /// Stored price at two decimal places. Zero when the document has none.
    pub price: Decimal,
    /// Server-assigned creation time. `None` while the write is pending.
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
}

impl Product {
    /// Price formatted for display, e.g. `$4.50`.
    #[must_use]
    pub fn price_display(&self) -> String {
        format!("${:.2}", self.price)
    }
}

impl CatalogItem for Product {
    const KIND: CollectionKind = CollectionKind::Products;

    fn from_document(document: &Document) -> Result<Self, DecodeError> {
        let price = Decimal::from_f64_retain(document.number("price")?)
            .unwrap_or_default()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let created_by = document.text("createdBy")?;
        Ok(Self {
            id: document.id.clone(),
            name: document.text("name")?,
            category: ProductCategory::from_label(&document.text("category")?),
            description: document.text("description")?,
            price,
            created_at: document.timestamp("createdAt"),
            created_by: (!created_by.is_empty()).then(|| UserId::new(created_by)),
        })
    }

    /// Newest first; pending timestamps sort before everything, then id.
    fn display_order(&self, other: &Self) -> Ordering {
        let by_time = match (&self.created_at, &other.created_at) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => b.cmp(a),
        };
        by_time.then_with(|| self.id.cmp(&other.id))
    }
}
