//! Boundary to the persistent tag store.
//!
//! The hierarchy engine never performs I/O itself. A store hands it complete
//! snapshots, and structural edits made through the store are followed by a
//! full rebuild rather than incremental tree surgery.

use std::collections::HashMap;

use anyhow::Result;

use crate::{TagId, TagRecord};

/// Source of tag records and per-tag document counts.
///
/// Lookups, updates and deletes on an unknown id fail with an error wrapping
/// [`HierarchyError::NotFound`](crate::HierarchyError::NotFound).
pub trait TagStore {
    /// Full flat snapshot of every tag.
    fn fetch_all_tags(&self) -> Result<Vec<TagRecord>>;

    /// Number of documents tagged directly with each tag.
    fn fetch_direct_counts(&self) -> Result<HashMap<TagId, u64>>;

    /// Persists a new tag and returns it as stored.
    fn create_tag(&self, record: &TagRecord) -> Result<TagRecord>;

    /// Replaces the tag with the given id and returns it as stored.
    fn update_tag(&self, id: &TagId, record: &TagRecord) -> Result<TagRecord>;

    /// Removes the tag with the given id.
    fn delete_tag(&self, id: &TagId) -> Result<()>;
}
