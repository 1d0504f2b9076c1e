//! Run counters and timing.
//!
//! The engine bumps a handful of named counters while it streams, and the
//! caller can print them or save them as JSON when the run is over.
//!
//! # Example
//!
//! ```
//! use ironsum::metrics::{MetricsCollector, RECORDS_READ};
//!
//! let mut metrics = MetricsCollector::new();
//! metrics.record_start();
//! metrics.increment_counter(RECORDS_READ, 3);
//! metrics.record_end();
//!
//! assert_eq!(metrics.counter(RECORDS_READ), 3);
//! assert!(metrics.to_json()["records_read"]["value"] == 3);
//! ```

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

pub const FILES_READ: &str = "files_read";
pub const RECORDS_READ: &str = "records_read";
pub const LINES_SKIPPED: &str = "lines_skipped";
pub const RECORDS_REJECTED: &str = "records_rejected";
pub const PARSE_WARNINGS: &str = "parse_warnings";
pub const GROUPS: &str = "groups";
pub const KEY_COLLISIONS: &str = "key_collisions";
pub const ROWS_WRITTEN: &str = "rows_written";

fn description(name: &str) -> Option<&'static str> {
    Some(match name {
        FILES_READ => "Input files consumed",
        RECORDS_READ => "Non-empty records read after skipped lines",
        LINES_SKIPPED => "Leading lines skipped across all files",
        RECORDS_REJECTED => "Records dropped for having too few fields",
        PARSE_WARNINGS => "Sum fields that were not integers",
        GROUPS => "Distinct groups",
        KEY_COLLISIONS => "Distinct key tuples that shared a fingerprint",
        ROWS_WRITTEN => "Group rows written to the output",
        _ => return None,
    })
}

/// Named counters plus start/end timestamps for one run.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    counters: BTreeMap<String, u64>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn record_end(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Elapsed time between start and end, if both were recorded.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to the named counter, creating it at 0 first if needed.
    pub fn increment_counter(&mut self, name: &str, value: u64) {
        *self.counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn set_counter(&mut self, name: &str, value: u64) {
        self.counters.insert(name.to_string(), value);
    }

    /// Current value of a counter (0 if never touched).
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// All metrics as a JSON object of `{ name: { value, description? } }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut metrics_json = serde_json::Map::new();

        for (name, value) in &self.counters {
            let mut metric_obj = serde_json::Map::new();
            metric_obj.insert("value".to_string(), json!(value));
            if let Some(desc) = description(name) {
                metric_obj.insert("description".to_string(), json!(desc));
            }
            metrics_json.insert(name.clone(), Value::Object(metric_obj));
        }

        if let Some(elapsed) = self.elapsed() {
            metrics_json.insert(
                "elapsed_ms".to_string(),
                json!({
                    "value": elapsed.as_millis(),
                    "description": "Total run time in milliseconds",
                }),
            );
        }
        Value::Object(metrics_json)
    }

    /// Print all metrics to stdout in a human-readable format.
    pub fn print(&self) {
        println!("\n========== Aggregation Metrics ==========");
        if let Some(elapsed) = self.elapsed() {
            println!(
                "Execution Time: {:.3}s ({} ms)",
                elapsed.as_secs_f64(),
                elapsed.as_millis()
            );
            println!("-----------------------------------------");
        }
        for (name, value) in &self.counters {
            match description(name) {
                Some(desc) => println!("{name}: {value} ({desc})"),
                None => println!("{name}: {value}"),
            }
        }
        println!("=========================================\n");
    }

    /// Save all metrics to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
