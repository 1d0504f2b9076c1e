//! File input and output.
//!
//! - [`source`]: memory-mapped, newline-delimited record sources
//! - [`glob`]: input discovery by directory, extension, or glob pattern
//! - [`output`]: output file creation

pub mod glob;
pub mod output;
pub mod source;

pub use glob::{discover_dir, expand_glob, expand_glob_required};
pub use output::create_output;
pub use source::{Record, RecordSource, Records};
