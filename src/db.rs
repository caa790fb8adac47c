mod schema;

use std::path::Path;

use anyhow::{Result, bail};
use rusqlite::Connection;

use schema::{INITIAL_SCHEMA, SCHEMA_VERSION};

/// SQLite connection holding the tag store schema.
///
/// Opening a database always brings the schema up to date and stamps it with
/// the current schema version in `PRAGMA user_version`. A file written by a
/// newer schema is refused.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a private in-memory store, mainly for tests.
    pub fn in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    /// Opens or creates the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Self::prepare(Connection::open(path)?)?;
        tracing::debug!(path = %path.display(), "opened tag database");
        Ok(db)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        let found = self.schema_version()?;
        if found > SCHEMA_VERSION {
            bail!("database schema version {found} is newer than supported version {SCHEMA_VERSION}");
        }

        // Cascading deletes on document_tags depend on this pragma.
        self.conn.pragma_update(None, "foreign_keys", true)?;
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        if found < SCHEMA_VERSION {
            self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    /// Value of `PRAGMA user_version`; 0 for a file that was never initialized.
    pub fn schema_version(&self) -> Result<i64> {
        let version = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
