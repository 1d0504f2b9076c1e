//! Tests that drive the `ironsum` binary.

use anyhow::Result;
use ironsum::testing::*;
use std::fs::{self, create_dir_all};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn ironsum(dir: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_ironsum"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()?)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_empty_key_list_exits_with_status_1() -> Result<()> {
    let dir = TempDir::new()?;
    write_sample(dir.path(), "in.csv")?;

    let output = ironsum(dir.path(), &["-k", "", "-s", "2", "-p", "0;2", "-f", "in.csv"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Key fields list is empty!"));
    assert!(!dir.path().join("out.csv").exists());
    Ok(())
}

#[test]
fn test_oversized_range_is_a_configuration_error() -> Result<()> {
    let dir = TempDir::new()?;
    write_sample(dir.path(), "in.csv")?;

    let output = ironsum(
        dir.path(),
        &["-k", "0", "-s", "0-99999999999", "-p", "0", "-f", "in.csv"],
    )?;

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("-s"), "stderr: {err}");
    assert!(err.contains("0-99999999999"), "stderr: {err}");
    Ok(())
}

#[test]
fn test_missing_input_reports_context_chain() -> Result<()> {
    let dir = TempDir::new()?;

    let output = ironsum(dir.path(), &["-k", "0", "-s", "2", "-p", "0;2", "-f", "nope.csv"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("open nope.csv"));
    assert!(!dir.path().join("out.csv").exists());
    Ok(())
}

#[test]
fn test_path_register_and_sort() -> Result<()> {
    let dir = TempDir::new()?;
    let raw = dir.path().join("raw");
    create_dir_all(&raw)?;
    write_fixture(&raw, "part1.csv", &["A,1,10", "B,2,-1"])?;
    write_fixture(&raw, "part2.csv", &["A,1,20"])?;
    write_fixture(&raw, "notes.txt", &["A,1,1000"])?;

    let output = ironsum(
        dir.path(),
        &[
            "-r", "%t:2024", "-k", "0", "-s", "2", "-p", "%t;0;2", "--path", "raw", "--sort",
        ],
    )?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv"))?,
        "2024,A,30\n2024,B,-1\n"
    );
    Ok(())
}

#[test]
fn test_header_separators_and_output_file() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path(), "in.tsv", &["k\tv", "a\t1", "a\t2"])?;

    let output = ironsum(
        dir.path(),
        &[
            "-k", "0", "-s", "1", "-p", "0;1", "-f", "in.tsv",
            "--input-sep", "tab", "--output-sep", "pipe", "--skip-line", "1",
            "--set-header", "key|total", "--output-file", "nested/out.psv",
        ],
    )?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        fs::read_to_string(dir.path().join("nested/out.psv"))?,
        "key|total\na|3\n"
    );
    Ok(())
}

#[test]
fn test_key_separator_splits_trusted_fingerprints() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path(), "in.csv", &["ab,c,1", "a,bc,2"])?;
    let base = ["-k", "0;1", "-s", "2", "-p", "0;1;2", "-f", "in.csv", "--trust-hash", "--sort"];

    let merged = ironsum(dir.path(), &base)?;
    assert!(merged.status.success(), "stderr: {}", stderr(&merged));
    assert_eq!(fs::read_to_string(dir.path().join("out.csv"))?, "ab,c,3\n");

    let mut args = base.to_vec();
    args.extend(["--key-separator", "\\0"]);
    let separated = ironsum(dir.path(), &args)?;
    assert!(separated.status.success(), "stderr: {}", stderr(&separated));
    assert_eq!(
        fs::read_to_string(dir.path().join("out.csv"))?,
        "a,bc,2\nab,c,1\n"
    );
    Ok(())
}

#[test]
fn test_errors_and_metrics_files() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path(), "in.csv", &["A,1,x", "A,1,4", "B,2"])?;

    let mut args = vec![
        "-k", "0", "-s", "2", "-p", "0;2", "-f", "in.csv", "--errors-file", "errors.json",
        "--verbose",
    ];
    if cfg!(feature = "metrics") {
        args.extend(["--metrics-file", "metrics.json"]);
    }
    let output = ironsum(dir.path(), &args)?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("out.csv"))?, "A,4\n");
    assert!(stderr(&output).contains("in.csv:3: expected at least 3 fields"));

    let errors: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("errors.json"))?)?;
    assert_eq!(errors[0]["line"], 1);
    assert_eq!(errors[0]["errors"][0]["code"], "parse");
    assert_eq!(errors[1]["line"], 3);
    assert_eq!(errors[1]["errors"][0]["code"], "short_record");

    if cfg!(feature = "metrics") {
        let metrics: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("metrics.json"))?)?;
        assert_eq!(metrics["groups"]["value"], 1);
        assert_eq!(metrics["records_rejected"]["value"], 1);
        assert_eq!(metrics["parse_warnings"]["value"], 1);
        assert!(String::from_utf8(output.stdout)?.contains("Aggregation Metrics"));
    }
    Ok(())
}

#[test]
fn test_dry_run_prints_report_without_output() -> Result<()> {
    let dir = TempDir::new()?;
    write_sample(dir.path(), "in.csv")?;

    let output = ironsum(
        dir.path(),
        &["-k", "0", "-s", "2", "-p", "%t;0;2", "-f", "in.csv", "--dry-run"],
    )?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Reading file: in.csv"));
    assert!(stdout.contains("#fields:\t3"));
    assert!(stdout.contains("Register %t used but not initialized"));
    assert!(!dir.path().join("out.csv").exists());
    Ok(())
}
