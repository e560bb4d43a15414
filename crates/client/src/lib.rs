//! StoreHub client library.
//!
//! Everything an app needs between its configuration and its presentation
//! layer:
//!
//! - [`config`] - Backend configuration loaded from the environment
//! - [`backend`] - Identity and collection service traits with hosted and
//!   in-memory implementations
//! - [`context`] - The explicit [`ClientContext`] owned by the app root
//! - [`session`] - One-shot authentication bootstrap and readiness signal
//! - [`feed`] - Live collection subscriber rendering full snapshots
//! - [`submit`] - Validated, single-flight product submission
//! - [`error`] - The error taxonomy surfaced to users
//!
//! # Lifecycle
//!
//! ```text
//! ClientContext ──► Session::start ──ready──► LiveFeed::spawn ──► FeedState
//!                                                   ▲
//! DraftSubmitter::submit ──create_document──────────┘ (observed via the feed)
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod session;
pub mod submit;

pub use backend::{
    BackendError, CollectionService, IdentityService, ListenerGuard, NewDocument, SnapshotEvent,
    SnapshotStream,
};
pub use config::{BackendConfig, BackendMode, ConfigError, HostedConfig};
pub use context::ClientContext;
pub use error::{ClientError, WriteError};
pub use feed::{FeedState, LiveFeed, ViewState};
pub use session::{AuthFallback, Session, SessionState};
pub use submit::DraftSubmitter;
