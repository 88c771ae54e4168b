//! Book entity and its JSON encoding

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single catalog entry
///
/// Serialized keys follow field order: `title`, `author`, `isbn`, then
/// `description` only when it is non-empty. Decoding is lenient: missing keys
/// become empty text and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub title: String,
    pub author: String,
    /// Opaque identifier, unique within a keyed catalog
    pub isbn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Encode as a JSON object
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    /// Decode from a JSON object
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Error::Decode)
    }
}

/// Encode a list of books as a JSON array
pub fn books_to_json(books: &[Book]) -> Result<Vec<u8>> {
    serde_json::to_vec(books).map_err(Error::Encode)
}
