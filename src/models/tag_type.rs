use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Category a tag belongs to.
///
/// Categories are informational: they take part in search and in type-based
/// ordering but never in the structure of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    /// A client or customer.
    Client,
    /// A technology, language or tool.
    Technology,
    /// A workflow status.
    Status,
    /// A general-purpose category.
    Category,
    /// A priority level.
    Priority,
    /// Anything else.
    Custom,
}

impl Default for TagType {
    fn default() -> Self {
        Self::Custom
    }
}

impl TagType {
    /// Returns the lowercase wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Technology => "technology",
            Self::Status => "status",
            Self::Category => "category",
            Self::Priority => "priority",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a known tag type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tag type: {0}")]
pub struct ParseTagTypeError(pub String);

impl FromStr for TagType {
    type Err = ParseTagTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "technology" => Ok(Self::Technology),
            "status" => Ok(Self::Status),
            "category" => Ok(Self::Category),
            "priority" => Ok(Self::Priority),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseTagTypeError(s.to_string())),
        }
    }
}
