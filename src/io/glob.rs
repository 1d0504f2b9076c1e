//! Input file discovery.
//!
//! Inputs can be named one by one, picked out of a directory by extension
//! (the historical `--path` option), or matched with a glob pattern. Every
//! helper returns regular files only, sorted, so a run over the same tree
//! always visits files in the same order.
//!
//! # Examples
//!
//! ```no_run
//! use ironsum::io::glob::{discover_dir, expand_glob};
//!
//! // Every .csv file directly inside a directory
//! let files = discover_dir("/mnt/stats/raw", "csv")?;
//!
//! // Date partitions
//! let partitions = expand_glob("data/year=2024/month=*/*.csv")?;
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```

use anyhow::{Context, Result, bail};
use glob::glob;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Supports standard glob patterns:
/// - `*` matches any sequence of characters within a path component
/// - `?` matches any single character
/// - `**` matches zero or more directories
/// - `[abc]` matches any character in the set
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a matched entry cannot be
/// read. No match at all is *not* an error; see [`expand_glob_required`].
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    result.sort();
    Ok(result)
}

/// Like [`expand_glob`], but zero matches is an error.
///
/// # Errors
///
/// Returns an error if the pattern is invalid, a matched entry cannot be
/// read, or nothing matches.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}

/// Regular files directly inside `dir` whose extension is `extension`.
///
/// The match is exact and case-sensitive, and subdirectories are not
/// entered.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed.
pub fn discover_dir(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;

    let mut result = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            result.push(path);
        }
    }

    result.sort();
    Ok(result)
}
