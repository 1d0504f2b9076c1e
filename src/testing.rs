//! Testing utilities for Ironsum runs.
//!
//! Aggregation reads files and writes a file, so most tests need a scratch
//! directory with a few inputs in it and a way to compare output rows that
//! come back in hash-table order. This module provides:
//!
//! - **Fixtures**: write input files from lines, and the classic two-group
//!   sample data set
//! - **Assertions**: compare output rows without caring about order
//!
//! # Quick Start
//!
//! ```no_run
//! use ironsum::config::{AggregateConfig, parse_projection};
//! use ironsum::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let input = write_fixture(dir.path(), "in.csv", &["A,1,10", "A,1,20", "B,2,-1"])?;
//! let output = dir.path().join("out.csv");
//!
//! let config = AggregateConfig::builder()
//!     .key_fields("0".parse()?)
//!     .sum_fields("2".parse()?)
//!     .projection(parse_projection("0;2")?)
//!     .input(input)
//!     .output_file(&output)
//!     .build()?;
//! ironsum::run(config)?;
//!
//! assert_rows_unordered_equal(&read_output_rows(&output)?, &["A,30", "B,-1"]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
