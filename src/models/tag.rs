use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{TagId, TagType};
use crate::utils::slugify;

/// Open key-value metadata attached to a tag.
pub type TagMetadata = BTreeMap<String, serde_json::Value>;

/// Flat description of one taxonomy entry.
///
/// A record optionally names its parent by id. Records are immutable for the
/// lifetime of a hierarchy snapshot; edits go through the tag store and are
/// picked up by the next rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// Stable identity, unique within a snapshot.
    pub id: TagId,
    /// Display name.
    pub name: String,
    /// URL-safe name.
    pub slug: String,
    /// Category of the tag.
    #[serde(rename = "type")]
    pub tag_type: TagType,
    /// Hex color, e.g. `#FF5733`.
    pub color: Option<String>,
    /// Short glyph shown next to the name.
    pub icon: Option<String>,
    /// Parent tag id. Absent or empty means the tag is a root.
    pub parent_id: Option<TagId>,
    pub description: Option<String>,
    pub metadata: Option<TagMetadata>,
    pub is_public: bool,
    pub is_system: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TagRecord {
    /// Starts building a record with the two mandatory fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagtree::TagRecord;
    ///
    /// let tag = TagRecord::builder("1", "Machine Learning").parent("0").build();
    /// assert_eq!(tag.slug, "machine-learning");
    /// assert_eq!(tag.parent().map(|p| p.as_str()), Some("0"));
    /// ```
    pub fn builder(id: impl Into<TagId>, name: impl Into<String>) -> TagRecordBuilder {
        TagRecordBuilder::new(id, name)
    }

    /// Name shown to users: the name when set, otherwise the slug.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.slug
        } else {
            &self.name
        }
    }

    /// Returns the parent reference, treating an empty id as no parent.
    pub fn parent(&self) -> Option<&TagId> {
        self.parent_id.as_ref().filter(|id| !id.is_empty())
    }
}

/// Builder for constructing `TagRecord` instances with optional fields.
#[derive(Debug)]
pub struct TagRecordBuilder {
    id: TagId,
    name: String,
    slug: Option<String>,
    tag_type: TagType,
    color: Option<String>,
    icon: Option<String>,
    parent_id: Option<TagId>,
    description: Option<String>,
    metadata: Option<TagMetadata>,
    is_public: bool,
    is_system: bool,
    is_active: bool,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
}

impl TagRecordBuilder {
    /// Creates a builder for a tag with the given id and name.
    pub fn new(id: impl Into<TagId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: None,
            tag_type: TagType::default(),
            color: None,
            icon: None,
            parent_id: None,
            description: None,
            metadata: None,
            is_public: false,
            is_system: false,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sets an explicit slug instead of deriving it from the name.
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn tag_type(mut self, tag_type: TagType) -> Self {
        self.tag_type = tag_type;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the parent tag id.
    pub fn parent(mut self, parent_id: impl Into<TagId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Sets or clears the parent tag id.
    pub fn parent_id(mut self, parent_id: Option<TagId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn metadata(mut self, metadata: TagMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: OffsetDateTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the `TagRecord`, deriving the slug and timestamps when unset.
    pub fn build(self) -> TagRecord {
        let now = OffsetDateTime::now_utc();
        let slug = self.slug.unwrap_or_else(|| slugify(&self.name));
        let created_at = self.created_at.unwrap_or(now);
        TagRecord {
            id: self.id,
            name: self.name,
            slug,
            tag_type: self.tag_type,
            color: self.color,
            icon: self.icon,
            parent_id: self.parent_id,
            description: self.description,
            metadata: self.metadata,
            is_public: self.is_public,
            is_system: self.is_system,
            is_active: self.is_active,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn builder_derives_slug_and_defaults() {
        let tag = TagRecord::builder("1", "Rust Lang").build();

        assert_eq!(tag.id, TagId::new("1"));
        assert_eq!(tag.slug, "rust-lang");
        assert_eq!(tag.tag_type, TagType::Custom);
        assert!(tag.is_active);
        assert!(!tag.is_public);
        assert!(!tag.is_system);
        assert!(tag.parent().is_none());
        assert_eq!(tag.created_at, tag.updated_at);
    }

    #[test]
    fn display_name_falls_back_to_slug() {
        let tag = TagRecord::builder("1", "").slug("fallback").build();
        assert_eq!(tag.display_name(), "fallback");

        let named = TagRecord::builder("2", "Named").slug("ignored").build();
        assert_eq!(named.display_name(), "Named");
    }

    #[test]
    fn empty_parent_id_is_treated_as_root() {
        let tag = TagRecord::builder("1", "Orphan").parent("").build();
        assert!(tag.parent_id.is_some());
        assert!(tag.parent().is_none());
    }

    #[test]
    fn serializes_with_camel_case_and_type_field() {
        let created = datetime!(2024-03-01 12:00 UTC);
        let tag = TagRecord::builder("7", "Acme")
            .tag_type(TagType::Client)
            .parent("3")
            .public(true)
            .created_at(created)
            .build();

        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["type"], "client");
        assert_eq!(json["parentId"], "3");
        assert_eq!(json["isPublic"], true);
        assert_eq!(json["createdAt"], "2024-03-01T12:00:00Z");

        let back: TagRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, tag);
    }
}
