//! Ironsum command line.
//!
//! Usage:
//!   ironsum -r %t:1982 -k "2-20" -s "21-35" -p "%t;1-35" --skip-line 1 \
//!       --path /mnt/stats/raw --output-file out.csv

use anyhow::{Context, Result};
use clap::Parser;
use ironsum::config::{
    AggregateConfig, AggregateConfigBuilder, FieldIndexSet, KeyIdentity, ParsePolicy, SplitMode,
    parse_input_separator, parse_output_separator, parse_projection, parse_register,
};
use ironsum::io::{discover_dir, expand_glob};
use ironsum::{DryRunReport, run};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ironsum")]
#[command(about = "Group rows of delimited text files by key fields and sum integer fields")]
#[command(version)]
#[command(after_help = "ex: ironsum -r %t:1982 -k \"2-20\" -s \"21-35\" -p \"%t;1-35\" \
    --skip-line 1 --path /mnt/stats/raw --output-file out.csv")]
struct Args {
    /// Key fields used for grouping, e.g. "0;2" or "2-20"
    #[arg(short = 'k', value_name = "KEYS")]
    keys: String,

    /// Sum fields accumulated per group, e.g. "21-35"
    #[arg(short = 's', value_name = "SUMS")]
    sums: String,

    /// Output columns: field ordinals and %registers, e.g. "%t;1-35"
    #[arg(short = 'p', value_name = "PROJECTION")]
    projection: String,

    /// Register definition NAME:VALUE, usable as %NAME in the projection
    #[arg(short = 'r', value_name = "REGISTER")]
    registers: Vec<String>,

    /// Number of leading lines to skip in every file
    #[arg(long = "skip-line", default_value_t = 0)]
    skip_line: usize,

    /// Input file (repeatable)
    #[arg(short = 'f', value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory whose *.csv files are all read (repeatable)
    #[arg(long, value_name = "DIR")]
    path: Vec<PathBuf>,

    /// Glob pattern of input files (repeatable)
    #[arg(long, value_name = "PATTERN")]
    glob: Vec<String>,

    /// Input separator (one byte; "\t", "tab", "pipe", ... accepted)
    #[arg(long = "input-sep", default_value = ",")]
    input_sep: String,

    /// Output separator
    #[arg(long = "output-sep", default_value = ",")]
    output_sep: String,

    /// Output file
    #[arg(long = "output-file", default_value = ironsum::config::DEFAULT_OUTPUT_FILE)]
    output_file: PathBuf,

    /// Integer meaning "no value"
    #[arg(long = "no-value", default_value_t = ironsum::config::DEFAULT_NO_VALUE, allow_hyphen_values = true)]
    no_value: i64,

    /// Header line written before any group
    #[arg(long = "set-header", value_name = "HEADER")]
    set_header: Option<String>,

    /// Check the configuration against the first input and exit
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Read non-integer sum fields as 0 instead of reporting them
    #[arg(long = "legacy-parse")]
    legacy_parse: bool,

    /// Blank a trailing field of one byte or less, like the historical tool
    #[arg(long = "legacy-split")]
    legacy_split: bool,

    /// Treat equal fingerprints as equal keys without comparing key text
    #[arg(long = "trust-hash")]
    trust_hash: bool,

    /// Byte hashed between key fields, removing concatenation ambiguity
    #[arg(long = "key-separator", value_name = "SEP")]
    key_separator: Option<String>,

    /// Sort output rows
    #[arg(long)]
    sort: bool,

    /// Write run metrics as JSON to this file
    #[cfg(feature = "metrics")]
    #[arg(long = "metrics-file", value_name = "PATH")]
    metrics_file: Option<PathBuf>,

    /// Write per-record problems as JSON to this file
    #[arg(long = "errors-file", value_name = "PATH")]
    errors_file: Option<PathBuf>,

    /// Log progress at info level, print record problems and run metrics
    #[arg(short, long)]
    verbose: bool,
}

fn resolve_inputs(args: &Args) -> Result<Vec<PathBuf>> {
    let mut inputs = args.files.clone();
    for dir in &args.path {
        inputs.extend(discover_dir(dir, "csv")?);
    }
    for pattern in &args.glob {
        inputs.extend(expand_glob(pattern)?);
    }
    Ok(inputs)
}

fn builder(args: &Args) -> Result<AggregateConfigBuilder> {
    let mut b = AggregateConfig::builder()
        .key_fields(args.keys.parse::<FieldIndexSet>().context("-k")?)
        .sum_fields(args.sums.parse::<FieldIndexSet>().context("-s")?)
        .projection(parse_projection(&args.projection).context("-p")?)
        .input_separator(parse_input_separator(&args.input_sep).context("--input-sep")?)
        .output_separator(parse_output_separator(&args.output_sep))
        .no_value(args.no_value)
        .skip_lines(args.skip_line)
        .inputs(resolve_inputs(args)?)
        .output_file(&args.output_file)
        .output_header(args.set_header.clone().unwrap_or_default())
        .parse_policy(if args.legacy_parse {
            ParsePolicy::LegacyZero
        } else {
            ParsePolicy::Strict
        })
        .split_mode(if args.legacy_split {
            SplitMode::Legacy
        } else {
            SplitMode::Uniform
        })
        .key_identity(if args.trust_hash {
            KeyIdentity::TrustHash
        } else {
            KeyIdentity::Verified
        })
        .key_separator(
            args.key_separator
                .as_deref()
                .map(parse_input_separator)
                .transpose()
                .context("--key-separator")?,
        )
        .sort_output(args.sort);
    for def in &args.registers {
        let (name, value) = parse_register(def).context("-r")?;
        b = b.register(name, value);
    }
    Ok(b)
}

fn execute(args: &Args) -> Result<()> {
    let builder = builder(args)?;

    if args.dry_run {
        let report = DryRunReport::inspect(&builder)?;
        print!("{report}");
        return Ok(());
    }

    let report = run(builder.build()?)?;

    if args.verbose {
        report.errors.print_errors();
    }

    if let Some(path) = &args.errors_file {
        report
            .errors
            .write_to_file(path)
            .with_context(|| format!("write {}", path.display()))?;
    }

    #[cfg(feature = "metrics")]
    {
        if args.verbose {
            report.metrics.print();
        }
        if let Some(path) = &args.metrics_file {
            report.metrics.save_to_file(path)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
