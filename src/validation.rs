//! Recoverable per-record problems.
//!
//! A record that cannot be fully used does not stop the run. The engine
//! logs it, records it here, and carries on; at the end the caller can
//! print the collected errors or export them as JSON.
//!
//! # Example
//!
//! ```
//! use ironsum::validation::{ErrorCollector, ValidationError};
//!
//! let mut collector = ErrorCollector::new();
//! collector.add_error(
//!     "sales.csv",
//!     12,
//!     vec![ValidationError::field("3", "not an integer: 'n/a'").with_code("parse")],
//! );
//! assert_eq!(collector.error_count(), 1);
//! assert!(collector.to_json()?.contains("sales.csv"));
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Error};
use std::path::Path;

/// Error code for a sum field that is not an integer.
pub const CODE_PARSE: &str = "parse";

/// Error code for a record with too few fields.
pub const CODE_SHORT_RECORD: &str = "short_record";

/// A single problem with one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field ordinal involved, if any.
    pub field: Option<String>,
    /// Human-readable error message
    pub message: String,
    /// Error code for categorization (optional)
    pub code: Option<String>,
}

impl ValidationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn field<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref field) = self.field {
            write!(f, "[field {}] {}", field, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref code) = self.code {
            write!(f, " (code: {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Every problem found in one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    /// Input file the record came from.
    pub file: String,
    /// 1-based physical line number.
    pub line: usize,
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, format_errors(&self.errors))
    }
}

/// Accumulates [`RecordError`]s over a run.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    errors: Vec<RecordError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the problems found in one record.
    pub fn add_error(&mut self, file: impl Into<String>, line: usize, errors: Vec<ValidationError>) {
        self.errors.push(RecordError {
            file: file.into(),
            line,
            errors,
        });
    }

    /// Number of records with at least one problem.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of individual problems across all records.
    pub fn problem_count(&self) -> usize {
        self.errors.iter().map(|e| e.errors.len()).sum()
    }

    /// Number of individual problems with the given code.
    pub fn count_code(&self, code: &str) -> usize {
        self.errors
            .iter()
            .flat_map(|e| &e.errors)
            .filter(|e| e.code.as_deref() == Some(code))
            .count()
    }

    pub fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Print all errors to stderr.
    pub fn print_errors(&self) {
        for record_err in &self.errors {
            eprintln!("{record_err}");
        }
    }

    /// Export errors to JSON format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.errors)
    }

    /// Write errors to a file in JSON format.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = self.to_json().map_err(Error::other)?;
        std::fs::write(path, json)
    }
}

impl fmt::Display for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCollector({} errors)", self.error_count())
    }
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
