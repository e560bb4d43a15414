//! Raw documents as delivered by a snapshot.
//!
//! Backends normalise their wire format into plain JSON field maps:
//! strings, numbers, booleans, and timestamps as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::DocumentId;

/// Field map of a single document.
pub type Fields = serde_json::Map<String, Value>;

/// Errors raised when a document cannot be decoded into a catalog item.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A field is present but has the wrong type.
    #[error("field `{field}` of document {id} must be a {expected}")]
    WrongType {
        id: DocumentId,
        field: &'static str,
        expected: &'static str,
    },
}

/// A document id together with its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    #[must_use]
    pub const fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Read a text field. Missing or null fields read as an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::WrongType`] if the field holds a non-string value.
    pub fn text(&self, field: &'static str) -> Result<String, DecodeError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.wrong_type(field, "string")),
        }
    }

    /// Read a numeric field. Missing or null fields read as zero; numeric
    /// strings are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::WrongType`] for any other value.
    pub fn number(&self, field: &'static str) -> Result<f64, DecodeError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(0.0),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| self.wrong_type(field, "number")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.wrong_type(field, "number")),
            Some(_) => Err(self.wrong_type(field, "number")),
        }
    }

    /// Read an RFC 3339 timestamp field.
    ///
    /// Missing, null or unparseable values read as `None`: a pending server
    /// timestamp is indistinguishable from an absent one on the client.
    #[must_use]
    pub fn timestamp(&self, field: &'static str) -> Option<DateTime<Utc>> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn wrong_type(&self, field: &'static str, expected: &'static str) -> DecodeError {
        DecodeError::WrongType {
            id: self.id.clone(),
            field,
            expected,
        }
    }
}
