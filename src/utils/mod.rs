pub mod tree_inspector;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

pub use tree_inspector::TreeInspector;

pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Ensures that the directory for the given file path exists
///
/// This function extracts the directory part of a given file path
/// and creates it if it doesn't exist.
pub fn ensure_directory_exists(file_path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}
