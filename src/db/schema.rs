/// Version stamped into `PRAGMA user_version` once the schema below is applied.
pub const SCHEMA_VERSION: i64 = 1;

/// Complete database schema for the tag store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// `parent_id` has no foreign key; dangling parents are demoted to roots when
/// the hierarchy is built.
pub const INITIAL_SCHEMA: &str = r#"
-- Tags table: one row per taxonomy entry
CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'custom',
    color TEXT,
    icon TEXT,
    parent_id TEXT,
    description TEXT,
    metadata TEXT,
    is_public INTEGER NOT NULL DEFAULT 0,
    is_system INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Junction table: links documents to tags (many-to-many)
CREATE TABLE IF NOT EXISTS document_tags (
    document_id TEXT NOT NULL,
    tag_id TEXT NOT NULL,
    created_at INTEGER,
    PRIMARY KEY (document_id, tag_id),
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

-- Index for child lookups when re-parenting
CREATE INDEX IF NOT EXISTS idx_tags_parent ON tags(parent_id);

-- Index for per-tag document counts
CREATE INDEX IF NOT EXISTS idx_document_tags_tag ON document_tags(tag_id);
"#;
