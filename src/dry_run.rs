//! Configuration diagnostics without aggregating anything.
//!
//! A dry run lists the inputs, splits the first line of the first input,
//! and checks the configured ordinals and registers against it. It never
//! writes an output file.

use crate::config::{AggregateConfigBuilder, ProjectionItem, SplitMode};
use crate::io::RecordSource;
use memchr::memchr;
use crate::split::FieldSplitter;
use anyhow::Result;
use std::fmt;
use std::path::PathBuf;

/// What a dry run found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunReport {
    pub files: Vec<PathBuf>,
    /// Fields in the first line of the first file.
    pub field_count: usize,
    /// The first line has a single field: the separator is probably wrong.
    /// When set, the remaining checks were not run.
    pub bad_separator: bool,
    pub key_count: usize,
    pub sum_count: usize,
    pub projection_count: usize,
    pub header: Option<String>,
    /// Ordinals of the first line not referenced by the projection.
    pub unprojected: Vec<usize>,
    /// Registers referenced by the projection but never defined.
    pub undefined_registers: Vec<String>,
    /// Ordinals configured as both key and sum fields.
    pub key_sum_overlap: Vec<usize>,
    pub keys_out_of_range: usize,
    pub sums_out_of_range: usize,
    pub projection_out_of_range: usize,
}

impl DryRunReport {
    /// Inspect `builder` against the first line of its first input.
    ///
    /// The line is taken as is: skipped lines are not skipped, and a blank
    /// first line reports a bad separator.
    ///
    /// # Errors
    /// Returns an error if a required list is empty, no input is configured,
    /// or the first input cannot be read.
    pub fn inspect(builder: &AggregateConfigBuilder) -> Result<Self> {
        builder.check_required()?;
        let files = builder.input_paths().to_vec();

        let source = RecordSource::open(&files[0])?;
        let first = first_line(source.bytes());
        let field_count = FieldSplitter::new(builder.input_separator_byte(), SplitMode::Uniform)
            .split(first)
            .len();

        let keys = builder.key_field_set();
        let sums = builder.sum_field_set();
        let items = builder.projection_items();

        let mut report = DryRunReport {
            files,
            field_count,
            bad_separator: field_count == 1,
            key_count: keys.len(),
            sum_count: sums.len(),
            projection_count: items.len(),
            header: builder.header().map(str::to_string),
            unprojected: Vec::new(),
            undefined_registers: Vec::new(),
            key_sum_overlap: Vec::new(),
            keys_out_of_range: 0,
            sums_out_of_range: 0,
            projection_out_of_range: 0,
        };
        if report.bad_separator {
            return Ok(report);
        }

        let projected: Vec<usize> = items
            .iter()
            .filter_map(|i| match i {
                ProjectionItem::Ordinal(o) => Some(*o),
                ProjectionItem::Register(_) => None,
            })
            .collect();

        report.unprojected = (0..field_count).filter(|o| !projected.contains(o)).collect();

        for item in items {
            if let ProjectionItem::Register(name) = item
                && !builder.registers().contains_key(name)
                && !report.undefined_registers.contains(name)
            {
                report.undefined_registers.push(name.clone());
            }
        }

        let mut overlap: Vec<usize> = keys
            .ordinals()
            .iter()
            .copied()
            .filter(|o| sums.contains(*o))
            .collect();
        overlap.sort_unstable();
        report.key_sum_overlap = overlap;

        report.keys_out_of_range = keys.ordinals().iter().filter(|&&o| o >= field_count).count();
        report.sums_out_of_range = sums.ordinals().iter().filter(|&&o| o >= field_count).count();
        report.projection_out_of_range = projected.iter().filter(|&&o| o >= field_count).count();

        Ok(report)
    }

    /// Whether any check found a problem.
    pub fn has_problems(&self) -> bool {
        self.bad_separator
            || self.key_count > self.field_count
            || self.sum_count > self.field_count
            || !self.undefined_registers.is_empty()
            || !self.key_sum_overlap.is_empty()
            || self.keys_out_of_range > 0
            || self.sums_out_of_range > 0
            || self.projection_out_of_range > 0
    }
}

/// The first physical line of `data`, blank or not, without its terminator.
fn first_line(data: &[u8]) -> &[u8] {
    let line = &data[..memchr(b'\n', data).unwrap_or(data.len())];
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for DryRunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "Reading file: {}", file.display())?;
        }
        writeln!(f)?;

        if self.bad_separator {
            return writeln!(f, "Bad separator: size = {}", self.field_count);
        }

        writeln!(f, "#fields:\t{}", self.field_count)?;
        writeln!(f, "keys size:\t{}", self.key_count)?;
        writeln!(f, "aggr size:\t{}", self.sum_count)?;
        writeln!(f, "prj size:\t{}", self.projection_count)?;
        writeln!(f, "Output Header:\t{}", self.header.as_deref().unwrap_or(""))?;

        if self.unprojected.is_empty() {
            writeln!(f, "#fields not used in projection: none")?;
        } else {
            writeln!(f, "#fields not used in projection: {}", join(&self.unprojected))?;
        }

        if self.key_count > self.field_count {
            writeln!(
                f,
                "Keys field list is too big: ({}>{})",
                self.key_count, self.field_count
            )?;
        }
        if self.sum_count > self.field_count {
            writeln!(
                f,
                "Aggregation field list is too big: ({}>{})",
                self.sum_count, self.field_count
            )?;
        }
        for name in &self.undefined_registers {
            writeln!(f, "Register %{name} used but not initialized")?;
        }
        if !self.key_sum_overlap.is_empty() {
            writeln!(
                f,
                "Elements that are both present in keys and in aggregation: {}",
                join(&self.key_sum_overlap)
            )?;
        }
        for (count, list) in [
            (self.keys_out_of_range, "Keys"),
            (self.sums_out_of_range, "Aggregation"),
            (self.projection_out_of_range, "Projection"),
        ] {
            if count > 0 {
                writeln!(
                    f,
                    "There are {count} elements in {list} list that exceed the total number of fields"
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregateConfig, parse_projection};
    use std::fs;

    #[test]
    fn reports_problems_against_first_record() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("in.csv");
        fs::write(&path, "a,b,c\n1,2,3\n")?;

        let builder = AggregateConfig::builder()
            .key_fields("0;2".parse()?)
            .sum_fields("2;5".parse()?)
            .projection(parse_projection("%t;%u;0;7")?)
            .register("u", "x")
            .input(&path);
        let report = DryRunReport::inspect(&builder)?;

        assert_eq!(report.field_count, 3);
        assert!(!report.bad_separator);
        assert_eq!(report.unprojected, vec![1, 2]);
        assert_eq!(report.undefined_registers, vec!["t".to_string()]);
        assert_eq!(report.key_sum_overlap, vec![2]);
        assert_eq!(report.sums_out_of_range, 1);
        assert_eq!(report.projection_out_of_range, 1);
        assert!(report.has_problems());

        let text = report.to_string();
        assert!(text.contains("#fields:\t3"));
        assert!(text.contains("Register %t used but not initialized"));
        Ok(())
    }

    #[test]
    fn single_field_means_bad_separator() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("in.csv");
        fs::write(&path, "a;b;c\n")?;

        let builder = AggregateConfig::builder()
            .key_fields("0".parse()?)
            .sum_fields("1".parse()?)
            .projection(parse_projection("0;1")?)
            .input(&path);
        let report = DryRunReport::inspect(&builder)?;
        assert!(report.bad_separator);
        assert!(report.to_string().contains("Bad separator: size = 1"));
        Ok(())
    }

    #[test]
    fn leading_blank_line_is_inspected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("in.csv");
        fs::write(&path, "\r\nA,1,10\n")?;

        let builder = AggregateConfig::builder()
            .key_fields("0".parse()?)
            .sum_fields("2".parse()?)
            .projection(parse_projection("0;2")?)
            .input(&path);
        let report = DryRunReport::inspect(&builder)?;
        assert!(report.bad_separator);
        assert_eq!(report.field_count, 1);
        Ok(())
    }

    #[test]
    fn empty_lists_fail_before_reading() {
        let builder = AggregateConfig::builder().input("missing.csv");
        assert!(DryRunReport::inspect(&builder).is_err());
    }
}
