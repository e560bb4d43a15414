//! Newtype IDs for type-safe references to externally assigned identifiers.
//!
//! Every identifier in StoreHub is an opaque string handed out by the hosted
//! backend (document ids, user ids) or by deployment configuration (tenant
//! ids). Use the `define_id!` macro to create wrappers that prevent mixing
//! them up.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use storehub_core::define_id;
/// define_id!(UserId);
/// define_id!(DocumentId);
///
/// let user_id = UserId::new("abc");
/// let document_id = DocumentId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = document_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(DocumentId);
define_id!(UserId);
define_id!(TenantId);

/// Idempotency key attached to a single draft submission.
///
/// Generated when a draft is created or reset and reused for every retry of
/// that draft, so a repeated create call resolves to the same document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
)]
#[serde(transparent)]
pub struct SubmissionId(uuid::Uuid);

impl SubmissionId {
    /// Generate a fresh random submission id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a submission id previously rendered with `Display`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        uuid::Uuid::parse_str(s).map(Self)
    }

    /// The document id a submission with this key is written under.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        DocumentId::new(self.0.simple().to_string())
    }
}

impl ::core::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
