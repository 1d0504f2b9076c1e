//! # Ironsum
//!
//! A **streaming group-by/sum engine** for large delimited text files.
//! Ironsum partitions rows into groups by a set of key columns, accumulates
//! selected integer columns per group with explicit absence handling, and
//! writes a chosen projection of key, sum and literal columns to one output
//! file.
//!
//! ## Key Features
//!
//! - **Zero-copy input** - files are memory-mapped and split into borrowed fields
//! - **Hash-based grouping** - xxHash64 fingerprints over the raw key bytes
//! - **Null-aware sums** - a "no value" sentinel is an absent observation, never a zero
//! - **Literal registers** - constant columns such as a reporting year in every row
//! - **Compatibility switches** - reproduce the historical tool's quirks when needed
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironsum::config::{AggregateConfig, parse_projection};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let config = AggregateConfig::builder()
//!     .key_fields("0".parse()?)
//!     .sum_fields("2".parse()?)
//!     .projection(parse_projection("%t;0;2")?)
//!     .register("t", "2024")
//!     .input("sales.csv")
//!     .output_file("totals.csv")
//!     .build()?;
//!
//! let report = ironsum::run(config)?;
//! println!("{} groups", report.summary.groups);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Records and fields
//!
//! A [`RecordSource`](io::RecordSource) maps one file and yields its
//! newline-delimited records. The [`FieldSplitter`] cuts each record on a
//! single separator byte; there is no quoting. N separators always give N+1
//! fields.
//!
//! ### Groups
//!
//! The [`KeyBuilder`] hashes the key fields of a record into a 64-bit
//! fingerprint. The [`Accumulator`] maps fingerprints to [`GroupEntry`]
//! values, which keep the key text from the first record seen and one
//! [`SumValue`] per sum field.
//!
//! ### Sums
//!
//! A sum field that holds the sentinel (default `-1`) is *absent*. Absent
//! observations never change a valid sum, and a group's sum stays invalid
//! only if every observation was absent. Invalid sums render as the
//! sentinel.
//!
//! ### Projection
//!
//! The [`ProjectionEmitter`] renders each group as one line, walking the
//! projection tokens in order. Output order follows the hash table and is
//! not stable unless sorting is requested.
//!
//! ## Feature Flags
//!
//! - `metrics` - run counters and timing, exportable as JSON
//!
//! ## Module Overview
//!
//! - [`config`] - configuration parsing and validation
//! - [`io`] - memory-mapped sources, input discovery, output files
//! - [`split`] - field splitting
//! - [`key`] - fingerprints
//! - [`combiners`] - the null-aware merge rule
//! - [`accumulator`] - the group table
//! - [`projection`] - output rendering
//! - [`runner`] - the streaming driver
//! - [`dry_run`] - configuration diagnostics
//! - [`validation`] - per-record error collection
//! - [`testing`] - helpers for tests that drive the engine through files

pub mod accumulator;
pub mod combiners;
pub mod config;
pub mod dry_run;
pub mod error;
pub mod io;
pub mod key;
pub mod projection;
pub mod runner;
pub mod split;
pub mod testing;
pub mod validation;

#[cfg(feature = "metrics")]
pub mod metrics;

// General re-exports
pub use accumulator::{Accumulator, GroupEntry};
pub use combiners::{CombineFn, NullAwareSum, SumValue};
pub use config::{AggregateConfig, FieldIndexSet, KeyIdentity, ParsePolicy, SplitMode};
pub use dry_run::DryRunReport;
pub use error::ConfigError;
pub use key::KeyBuilder;
pub use projection::{ProjectionEmitter, ProjectionToken};
pub use runner::{Aggregator, RunReport, RunSummary, run};
pub use split::FieldSplitter;
pub use validation::ErrorCollector;

// Gated re-exports
#[cfg(feature = "metrics")]
pub use metrics::MetricsCollector;
