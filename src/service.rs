use std::collections::HashMap;

use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    Database, DocumentId, HierarchyError, TagId, TagMetadata, TagRecord, TagStore, TagType,
};

const TAG_COLUMNS: &str = "id, name, slug, type, color, icon, parent_id, description, metadata, \
                           is_public, is_system, is_active, created_at, updated_at";

/// A tag write rejected before it reached the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagValidationError {
    #[error("Tag id cannot be empty")]
    EmptyId,

    #[error("Tag name cannot be empty")]
    EmptyName,

    #[error("Tag {0} already exists")]
    AlreadyExists(TagId),

    #[error("Tag {0} cannot be its own parent")]
    SelfParent(TagId),
}

/// Service layer persisting tags and document tag assignments in SQLite.
///
/// TagService owns a Database instance and implements [`TagStore`], so a
/// [`HierarchyManager`](crate::HierarchyManager) can be refreshed straight
/// from it. This service is UI-independent.
///
/// # Examples
///
/// ```
/// use tagtree::{Database, HierarchyManager, TagRecord, TagService, TagStore};
///
/// # fn main() -> anyhow::Result<()> {
/// let service = TagService::new(Database::in_memory()?);
/// service.create_tag(&TagRecord::builder("eng", "Engineering").build())?;
/// service.create_tag(&TagRecord::builder("rust", "Rust").parent("eng").build())?;
///
/// let mut manager = HierarchyManager::default();
/// manager.refresh_from(&service)?;
/// assert_eq!(manager.path("rust")?, "Engineering > Rust");
/// # Ok(())
/// # }
/// ```
pub struct TagService {
    db: Database,
}

impl TagService {
    /// Creates a new TagService with the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or advanced operations that need direct database access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Retrieves a tag by its ID.
    ///
    /// Returns `None` if no tag exists with the given ID. This is not
    /// considered an error condition.
    pub fn get_tag(&self, id: &str) -> Result<Option<TagRecord>> {
        let conn = self.db.connection();
        let tag = conn
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = ?1"),
                [id],
                row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    /// Tags a document. Returns false when the document already carried the tag.
    pub fn tag_document(&self, document: &DocumentId, tag: &TagId) -> Result<bool> {
        self.ensure_exists(tag)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let inserted = self.db.connection().execute(
            "INSERT OR IGNORE INTO document_tags (document_id, tag_id, created_at) VALUES (?1, ?2, ?3)",
            params![document.as_str(), tag.as_str(), now],
        )?;
        Ok(inserted > 0)
    }

    /// Removes a tag from a document. Returns false when it was not tagged.
    pub fn untag_document(&self, document: &DocumentId, tag: &TagId) -> Result<bool> {
        let removed = self.db.connection().execute(
            "DELETE FROM document_tags WHERE document_id = ?1 AND tag_id = ?2",
            params![document.as_str(), tag.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn ensure_exists(&self, id: &TagId) -> Result<()> {
        let exists: bool = self.db.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1)",
            [id.as_str()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(HierarchyError::NotFound(id.clone()).into());
        }
        Ok(())
    }

    fn require_tag(&self, id: &TagId) -> Result<TagRecord> {
        self.get_tag(id.as_str())?
            .ok_or_else(|| HierarchyError::NotFound(id.clone()).into())
    }
}

impl TagStore for TagService {
    fn fetch_all_tags(&self) -> Result<Vec<TagRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY id"))?;
        let tags = stmt
            .query_map([], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn fetch_direct_counts(&self) -> Result<HashMap<TagId, u64>> {
        let conn = self.db.connection();
        let mut stmt =
            conn.prepare("SELECT tag_id, COUNT(*) FROM document_tags GROUP BY tag_id")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((TagId::new(id), u64::try_from(count).unwrap_or(0)))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (id, count) = row?;
            counts.insert(id, count);
        }
        Ok(counts)
    }

    fn create_tag(&self, record: &TagRecord) -> Result<TagRecord> {
        validate(&record.id, record)?;
        if self.get_tag(record.id.as_str())?.is_some() {
            return Err(TagValidationError::AlreadyExists(record.id.clone()).into());
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let metadata = record
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.db.connection().execute(
            &format!("INSERT INTO tags ({TAG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"),
            params![
                record.id.as_str(),
                record.name,
                record.slug,
                record.tag_type.as_str(),
                record.color,
                record.icon,
                record.parent().map(TagId::as_str),
                record.description,
                metadata,
                record.is_public,
                record.is_system,
                record.is_active,
                now,
                now,
            ],
        )?;

        tracing::info!(id = %record.id, "created tag");
        self.require_tag(&record.id)
    }

    fn update_tag(&self, id: &TagId, record: &TagRecord) -> Result<TagRecord> {
        validate(id, record)?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let metadata = record
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let changed = self.db.connection().execute(
            "UPDATE tags SET name = ?2, slug = ?3, type = ?4, color = ?5, icon = ?6,
                 parent_id = ?7, description = ?8, metadata = ?9, is_public = ?10,
                 is_system = ?11, is_active = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                id.as_str(),
                record.name,
                record.slug,
                record.tag_type.as_str(),
                record.color,
                record.icon,
                record.parent().map(TagId::as_str),
                record.description,
                metadata,
                record.is_public,
                record.is_system,
                record.is_active,
                now,
            ],
        )?;

        if changed == 0 {
            return Err(HierarchyError::NotFound(id.clone()).into());
        }

        tracing::info!(%id, "updated tag");
        self.require_tag(id)
    }

    /// Deletes a tag, moving its children up to the deleted tag's parent.
    fn delete_tag(&self, id: &TagId) -> Result<()> {
        let conn = self.db.connection();
        let tx = conn.unchecked_transaction()?;

        let parent: Option<Option<String>> = tx
            .query_row(
                "SELECT parent_id FROM tags WHERE id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(parent) = parent else {
            return Err(HierarchyError::NotFound(id.clone()).into());
        };

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let moved = tx.execute(
            "UPDATE tags SET parent_id = ?1, updated_at = ?2 WHERE parent_id = ?3",
            params![parent, now, id.as_str()],
        )?;
        tx.execute("DELETE FROM tags WHERE id = ?1", [id.as_str()])?;
        tx.commit()?;

        tracing::info!(%id, reparented = moved, "deleted tag");
        Ok(())
    }
}

/// Rejects records the store must never hold.
fn validate(id: &TagId, record: &TagRecord) -> Result<(), TagValidationError> {
    if id.as_str().trim().is_empty() {
        return Err(TagValidationError::EmptyId);
    }
    if record.name.trim().is_empty() {
        return Err(TagValidationError::EmptyName);
    }
    if record.parent() == Some(id) {
        return Err(TagValidationError::SelfParent(id.clone()));
    }
    Ok(())
}

fn row_to_tag(row: &Row<'_>) -> rusqlite::Result<TagRecord> {
    let tag_type: String = row.get(3)?;
    let tag_type = tag_type
        .parse::<TagType>()
        .map_err(|e| conversion_error(3, Type::Text, e))?;

    let metadata: Option<String> = row.get(8)?;
    let metadata = metadata
        .map(|json| serde_json::from_str::<TagMetadata>(&json))
        .transpose()
        .map_err(|e| conversion_error(8, Type::Text, e))?;

    Ok(TagRecord {
        id: TagId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        slug: row.get(2)?,
        tag_type,
        color: row.get(4)?,
        icon: row.get(5)?,
        parent_id: row.get::<_, Option<String>>(6)?.map(TagId::new),
        description: row.get(7)?,
        metadata,
        is_public: row.get(9)?,
        is_system: row.get(10)?,
        is_active: row.get(11)?,
        created_at: timestamp(row, 12)?,
        updated_at: timestamp(row, 13)?,
    })
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let secs: i64 = row.get(idx)?;
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| conversion_error(idx, Type::Integer, e))
}

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}
