//! Shared utility functions for database location and tag naming.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable overriding the database location.
pub const DATABASE_ENV_VAR: &str = "TAGTREE_DB";

/// Gets the cross-platform database path.
///
/// Uses `TAGTREE_DB` when set, otherwise `{data_dir}/tagtree/tags.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("tagtree").join("tags.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Derives a URL-safe slug from a display name.
///
/// Lowercases alphanumerics, turns every other run of characters into a single
/// `-`, and trims leading and trailing dashes.
///
/// # Examples
///
/// ```
/// use tagtree::utils::slugify;
///
/// assert_eq!(slugify("Machine Learning / AI"), "machine-learning-ai");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
