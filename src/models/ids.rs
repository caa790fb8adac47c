use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a tag.
///
/// Tag identities are opaque strings assigned by the tag store. Wrapping them
/// prevents accidental mixing with document identifiers or display names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Creates a new tag ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying ID value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the ID carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TagId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TagId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// Allows `HashMap<TagId, _>` lookups with a plain `&str`.
impl Borrow<str> for TagId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a document that can carry tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new document ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying ID value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
