//! Output file creation.

use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::io::BufWriter;
use std::path::Path;

/// Create (or truncate) `path` for writing, creating parent directories
/// first.
///
/// # Errors
/// Returns an error if the directories or the file cannot be created.
pub fn create_output(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(BufWriter::new(f))
}
