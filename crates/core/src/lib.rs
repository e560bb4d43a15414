//! StoreHub Core - Shared types library.
//!
//! This crate provides common types used across all StoreHub components:
//! - `client` - Session bootstrap, live subscriptions and backend adapters
//! - `storefront` - Customer-facing store browser
//! - `admin` - Product-entry panel
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no async
//! runtime, no HTTP clients. Decoding, ordering and draft validation live here
//! so both apps share one definition of what a snapshot renders as.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, catalog items, drafts, collection paths and documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
