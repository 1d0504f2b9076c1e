//! Memory-mapped record source.
//!
//! A [`RecordSource`] owns the read-only mapping of one input file. Records
//! borrowed from it cannot outlive it, so a file's mapping is released as
//! soon as its source is dropped, while groups built from it keep only
//! their own copies of key text.

use anyhow::{Context, Result};
use memchr::memchr;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One newline-delimited record, borrowed from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// 1-based physical line number within the file.
    pub line: usize,
    /// Record bytes without the line terminator.
    pub bytes: &'a [u8],
}

/// Read-only mapping of one input file.
pub struct RecordSource {
    path: PathBuf,
    map: Option<Mmap>,
}

impl RecordSource {
    /// Map `path` read-only.
    ///
    /// Empty files are not mapped; they simply yield no records.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, inspected or mapped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        let map = if len == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and the tool assumes inputs
            // are not modified while it runs.
            let map = unsafe { Mmap::map(&file) }
                .with_context(|| format!("mmap {}", path.display()))?;
            Some(map)
        };
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole mapped file.
    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }

    /// Records of this file after skipping `skip_lines` physical lines.
    pub fn records(&self, skip_lines: usize) -> Records<'_> {
        Records::new(self.bytes(), skip_lines)
    }
}

/// Iterator over the non-empty records of a byte buffer.
///
/// - the first `skip` physical lines are dropped, empty or not
/// - a trailing `\r` is stripped from every line
/// - empty lines are dropped
/// - a last line without a terminating newline is still yielded
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
    skip: usize,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8], skip_lines: usize) -> Self {
        Self {
            data,
            pos: 0,
            line: 0,
            skip: skip_lines,
        }
    }

    /// Physical lines consumed so far, including skipped and empty ones.
    pub fn lines_consumed(&self) -> usize {
        self.line
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.data.len() {
            return None;
        }
        let data = self.data;
        let rest = &data[self.pos..];
        let end = memchr(b'\n', rest).unwrap_or(rest.len());
        self.pos += end + 1;
        self.line += 1;
        let line = &rest[..end];
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = self.next_line()?;
            if self.line <= self.skip || bytes.is_empty() {
                continue;
            }
            return Some(Record {
                line: self.line,
                bytes,
            });
        }
    }
}
