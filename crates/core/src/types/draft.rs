//! Product drafts entered in the admin form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::ProductCategory;
use super::document::Fields;
use super::id::{SubmissionId, UserId};
use super::price::{Price, PriceError};

/// Field holding the server-assigned creation time of a product.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Reasons a draft cannot be submitted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Product name is required")]
    EmptyName,
    #[error("Price is invalid: {0}")]
    InvalidPrice(#[from] PriceError),
}

/// Unvalidated form input for a new product.
///
/// Every draft carries the [`SubmissionId`] it will be written under; it is
/// regenerated by [`DraftProduct::reset`] so a fresh draft never collides
/// with the previous submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftProduct {
    pub submission_id: SubmissionId,
    pub name: String,
    pub description: String,
    /// Raw price text as typed by the user.
    pub price: String,
    pub category: ProductCategory,
}

impl Default for DraftProduct {
    fn default() -> Self {
        Self {
            submission_id: SubmissionId::generate(),
            name: String::new(),
            description: String::new(),
            price: String::new(),
            category: ProductCategory::Food,
        }
    }
}

impl DraftProduct {
    /// Check the draft and produce the values that will be persisted.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::EmptyName`] for a blank name and
    /// [`DraftError::InvalidPrice`] unless the price is a positive decimal.
    pub fn validate(&self) -> Result<ValidDraft, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::EmptyName);
        }
        let price = Price::parse(&self.price)?;
        Ok(ValidDraft {
            submission_id: self.submission_id,
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            category: self.category,
        })
    }

    /// Clear the draft back to empty defaults with a new submission id.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether every input field still holds its default value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.price.is_empty()
            && self.category == ProductCategory::Food
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub submission_id: SubmissionId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: ProductCategory,
}

impl ValidDraft {
    /// Document fields for the create call, without the server timestamp.
    #[must_use]
    pub fn into_fields(self, created_by: &UserId) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::String(self.name));
        fields.insert("description".into(), Value::String(self.description));
        fields.insert("price".into(), Value::from(self.price.to_f64()));
        fields.insert(
            "category".into(),
            Value::String(self.category.label().to_string()),
        );
        fields.insert(
            "createdBy".into(),
            Value::String(created_by.as_str().to_string()),
        );
        fields
    }
}
