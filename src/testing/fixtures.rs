//! Input fixtures and output readers.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Rows of the two-group sample: `A` sums to 30, `B` only ever holds the
/// sentinel.
pub const SAMPLE_ROWS: [&str; 3] = ["A,1,10", "A,1,20", "B,2,-1"];

/// Write `lines` (each terminated by `\n`) to `dir/name` and return the path.
///
/// # Errors
/// Returns an error if the file cannot be written.
///
/// # Example
///
/// ```
/// use ironsum::testing::write_fixture;
///
/// let dir = tempfile::tempdir()?;
/// let path = write_fixture(dir.path(), "a.csv", &["k,1", "k,2"])?;
/// assert_eq!(std::fs::read_to_string(path)?, "k,1\nk,2\n");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn write_fixture<S: AsRef<str>>(dir: &Path, name: &str, lines: &[S]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut body = String::new();
    for line in lines {
        body.push_str(line.as_ref());
        body.push('\n');
    }
    fs::write(&path, body).with_context(|| format!("write fixture {}", path.display()))?;
    Ok(path)
}

/// Write the [`SAMPLE_ROWS`] data set to `dir/name`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_sample(dir: &Path, name: &str) -> Result<PathBuf> {
    write_fixture(dir, name, &SAMPLE_ROWS)
}

/// Read an output file as a list of lines without their terminators.
///
/// # Errors
/// Returns an error if the file cannot be read or is not UTF-8.
pub fn read_output_rows(path: &Path) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read output {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}
