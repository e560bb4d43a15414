//! Authenticated identity handles.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// How an identity was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Redeemed from a one-time credential token supplied at startup.
    CustomToken,
    /// Anonymous identity issued by the identity service.
    Anonymous,
    /// Generated locally after authentication failed. Never accepted by the
    /// backend, so it always implies read-only mode.
    Placeholder,
}

/// An opaque user handle returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub kind: IdentityKind,
}

impl Identity {
    #[must_use]
    pub const fn new(uid: UserId, kind: IdentityKind) -> Self {
        Self { uid, kind }
    }

    /// Generate a local placeholder identity (`local-<uuid>`).
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            uid: UserId::new(format!("local-{}", uuid::Uuid::new_v4())),
            kind: IdentityKind::Placeholder,
        }
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self.kind, IdentityKind::Placeholder)
    }
}
