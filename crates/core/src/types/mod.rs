//! Core types for StoreHub.
//!
//! This module provides type-safe wrappers for the catalog domain.

pub mod catalog;
pub mod document;
pub mod draft;
pub mod id;
pub mod identity;
pub mod path;
pub mod price;

pub use catalog::{CatalogItem, Product, ProductCategory, Store, StoreCategory, sort_snapshot};
pub use document::{DecodeError, Document, Fields};
pub use draft::{CREATED_AT_FIELD, DraftError, DraftProduct, ValidDraft};
pub use id::*;
pub use identity::{Identity, IdentityKind};
pub use path::{CollectionKind, CollectionPath};
pub use price::{Price, PriceError};
