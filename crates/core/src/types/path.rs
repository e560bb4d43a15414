//! Collection addressing within a tenant.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::TenantId;

/// The public collections StoreHub reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Stores,
    Products,
}

impl CollectionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stores => "stores",
            Self::Products => "products",
        }
    }
}

/// Path of a tenant-scoped public collection:
/// `artifacts/{tenantId}/public/data/{stores|products}`.
///
/// ```
/// use storehub_core::{CollectionKind, CollectionPath, TenantId};
///
/// let path = CollectionPath::new(TenantId::new("t1"), CollectionKind::Stores);
/// assert_eq!(path.to_string(), "artifacts/t1/public/data/stores");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    tenant: TenantId,
    kind: CollectionKind,
}

impl CollectionPath {
    #[must_use]
    pub const fn new(tenant: TenantId, kind: CollectionKind) -> Self {
        Self { tenant, kind }
    }

    #[must_use]
    pub const fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Path of the parent document (`artifacts/{tenantId}/public/data`).
    #[must_use]
    pub fn parent(&self) -> String {
        format!("artifacts/{}/public/data", self.tenant)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent(), self.kind.as_str())
    }
}
