//! The streaming driver.
//!
//! [`Aggregator`] owns one run's state: the splitter, the key builder, the
//! group table and the error collector. Files are consumed strictly one
//! after another; each file's mapping is dropped before the next is opened.
//!
//! ```no_run
//! use ironsum::config::{AggregateConfig, parse_projection};
//! use ironsum::runner::run;
//!
//! let config = AggregateConfig::builder()
//!     .key_fields("0".parse()?)
//!     .sum_fields("2".parse()?)
//!     .projection(parse_projection("0;2")?)
//!     .input("sales.csv")
//!     .output_file("totals.csv")
//!     .build()?;
//!
//! let report = run(config)?;
//! println!("{} groups", report.summary.groups);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::accumulator::{Accumulator, FieldWarning};
use crate::config::AggregateConfig;
use crate::io::{RecordSource, Records, create_output};
#[cfg(feature = "metrics")]
use crate::metrics::{self, MetricsCollector};
use crate::key::KeyBuilder;
use crate::projection::ProjectionEmitter;
use crate::split::FieldSplitter;
use crate::validation::{CODE_PARSE, CODE_SHORT_RECORD, ErrorCollector, ValidationError};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub records: usize,
    pub lines_skipped: usize,
    pub records_rejected: usize,
    pub parse_warnings: usize,
    pub groups: usize,
    pub key_collisions: usize,
    pub rows_written: usize,
}

/// Everything a finished run hands back.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub errors: ErrorCollector,
    #[cfg(feature = "metrics")]
    pub metrics: MetricsCollector,
}

/// One aggregation run.
pub struct Aggregator {
    config: AggregateConfig,
    splitter: FieldSplitter,
    keys: KeyBuilder,
    acc: Accumulator,
    errors: ErrorCollector,
    summary: RunSummary,
    required: usize,
    warnings: Vec<FieldWarning>,
    #[cfg(feature = "metrics")]
    metrics: MetricsCollector,
}

impl Aggregator {
    pub fn new(config: AggregateConfig) -> Self {
        let splitter = FieldSplitter::new(config.input_separator, config.split_mode);
        let keys = KeyBuilder::new(config.key_fields.ordinals(), config.key_separator);
        let acc = Accumulator::new(
            config.key_fields.ordinals(),
            config.sum_fields.ordinals(),
            config.no_value,
            config.parse_policy,
            config.key_identity,
        );
        let required = config.required_fields();
        debug!(
            "keys [{}], sums [{}], records need {required} fields",
            config.key_fields, config.sum_fields
        );
        #[cfg(feature = "metrics")]
        let metrics = {
            let mut m = MetricsCollector::new();
            m.record_start();
            m
        };
        Self {
            config,
            splitter,
            keys,
            acc,
            errors: ErrorCollector::new(),
            summary: RunSummary::default(),
            required,
            warnings: Vec::new(),
            #[cfg(feature = "metrics")]
            metrics,
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.acc
    }

    pub fn errors(&self) -> &ErrorCollector {
        &self.errors
    }

    /// Totals so far; `groups` always reflects the current table.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            groups: self.acc.len(),
            key_collisions: self.acc.collisions(),
            ..self.summary.clone()
        }
    }

    /// Stream one file into the group table.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped. Nothing from
    /// the file is aggregated in that case.
    pub fn consume_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = RecordSource::open(path)?;
        let label = source.path().display().to_string();
        debug!("reading {label} ({} bytes)", source.bytes().len());
        self.consume_bytes(&label, source.bytes());
        Ok(())
    }

    /// Stream an in-memory buffer into the group table.
    ///
    /// `label` names the buffer in error reports.
    pub fn consume_bytes(&mut self, label: &str, data: &[u8]) {
        let skip = self.config.skip_lines;
        let before = self.errors.error_count();
        let mut records = Records::new(data, skip);

        for record in records.by_ref() {
            self.summary.records += 1;
            let fields = self.splitter.split(record.bytes);
            if fields.len() < self.required {
                self.summary.records_rejected += 1;
                debug!(
                    "{label}:{}: expected at least {} fields, found {}",
                    record.line,
                    self.required,
                    fields.len()
                );
                self.errors.add_error(
                    label,
                    record.line,
                    vec![
                        ValidationError::new(format!(
                            "expected at least {} fields, found {}",
                            self.required,
                            fields.len()
                        ))
                        .with_code(CODE_SHORT_RECORD),
                    ],
                );
                continue;
            }

            let fingerprint = self.keys.fingerprint(&fields);
            self.acc.merge(fingerprint, &fields, &mut self.warnings);

            if !self.warnings.is_empty() {
                self.summary.parse_warnings += self.warnings.len();
                let problems = self
                    .warnings
                    .drain(..)
                    .map(|w| {
                        debug!(
                            "{label}:{}: field {} is not an integer: '{}'",
                            record.line, w.ordinal, w.text
                        );
                        ValidationError::field(
                            w.ordinal.to_string(),
                            format!("not an integer: '{}'", w.text),
                        )
                        .with_code(CODE_PARSE)
                    })
                    .collect();
                self.errors.add_error(label, record.line, problems);
            }
        }

        self.summary.lines_skipped += records.lines_consumed().min(skip);
        self.summary.files += 1;

        let bad = self.errors.error_count() - before;
        if bad > 0 {
            warn!("{label}: {bad} records with problems");
        }
    }

    /// Render the header and every group into `w`.
    ///
    /// # Returns
    /// The number of group rows written.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, w: W) -> Result<usize> {
        let emitter = ProjectionEmitter::new(
            &self.config.projection,
            &self.config.output_separator,
            self.config.no_value,
        );
        emitter.emit(
            &self.acc,
            self.config.output_header.as_deref(),
            self.config.sort_output,
            w,
        )
    }

    /// Write the configured output file and return the final report.
    ///
    /// # Errors
    /// Returns an error if the output file cannot be created or written.
    pub fn finish(mut self) -> Result<RunReport> {
        let path = self.config.output_file.clone();
        let w = create_output(&path)?;
        let rows = self
            .write_to(w)
            .with_context(|| format!("write {}", path.display()))?;
        self.summary.rows_written = rows;
        let summary = self.summary();

        info!(
            "{} files, {} records, {} groups, {} rows written to {}",
            summary.files,
            summary.records,
            summary.groups,
            summary.rows_written,
            path.display()
        );

        #[cfg(feature = "metrics")]
        {
            self.metrics.record_end();
            let m = &mut self.metrics;
            m.set_counter(metrics::FILES_READ, summary.files as u64);
            m.set_counter(metrics::RECORDS_READ, summary.records as u64);
            m.set_counter(metrics::LINES_SKIPPED, summary.lines_skipped as u64);
            m.set_counter(metrics::RECORDS_REJECTED, summary.records_rejected as u64);
            m.set_counter(metrics::PARSE_WARNINGS, summary.parse_warnings as u64);
            m.set_counter(metrics::GROUPS, summary.groups as u64);
            m.set_counter(metrics::KEY_COLLISIONS, summary.key_collisions as u64);
            m.set_counter(metrics::ROWS_WRITTEN, summary.rows_written as u64);
        }

        Ok(RunReport {
            summary,
            errors: self.errors,
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        })
    }
}

/// Aggregate every configured input and write the output file.
///
/// Any unreadable input aborts the run before the output is written, so a
/// partial aggregate is never mistaken for a complete one.
///
/// # Errors
/// Returns the first IO error encountered.
pub fn run(config: AggregateConfig) -> Result<RunReport> {
    let inputs = config.inputs.clone();
    let mut agg = Aggregator::new(config);
    for path in &inputs {
        agg.consume_file(path)?;
    }
    agg.finish()
}
