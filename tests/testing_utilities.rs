//! Tests for the testing helpers and for configuration errors seen from the
//! public API.

use anyhow::Result;
use ironsum::config::{AggregateConfig, parse_projection, parse_register};
use ironsum::testing::*;
use ironsum::*;
use tempfile::TempDir;

#[test]
fn test_sample_fixture_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_sample(dir.path(), "sample.csv")?;
    let rows = read_output_rows(&path)?;
    assert_eq!(rows, SAMPLE_ROWS);
    Ok(())
}

#[test]
fn test_unordered_comparison() {
    let rows = vec!["B,-1".to_string(), "A,30".to_string()];
    assert_rows_unordered_equal(&rows, &["A,30", "B,-1"]);
    assert_has_row(&rows, "A,30");
}

#[test]
#[should_panic]
fn test_unordered_comparison_counts_duplicates() {
    assert_rows_unordered_equal(&["A,1", "A,1"], &["A,1"]);
}

#[test]
fn test_missing_lists_are_reported_in_order() -> Result<()> {
    let err = AggregateConfig::builder().build().unwrap_err();
    assert_eq!(err, ConfigError::EmptyProjection);

    let err = AggregateConfig::builder()
        .projection(parse_projection("0")?)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::EmptySumFields);

    let err = AggregateConfig::builder()
        .projection(parse_projection("0")?)
        .sum_fields("0".parse()?)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::EmptyKeyFields);

    let err = AggregateConfig::builder()
        .projection(parse_projection("0")?)
        .sum_fields("0".parse()?)
        .key_fields("1".parse()?)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::NoInputFiles);
    assert_eq!(err.to_string(), "No files selected");
    Ok(())
}

#[test]
fn test_projection_must_resolve() -> Result<()> {
    let base = || -> Result<_> {
        Ok(AggregateConfig::builder()
            .key_fields("0".parse()?)
            .sum_fields("2".parse()?)
            .input("in.csv"))
    };

    let err = base()?
        .projection(parse_projection("0;1")?)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::UnknownProjectionOrdinal(1));

    let err = base()?
        .projection(parse_projection("%t;0")?)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::UndefinedRegister("t".to_string()));

    let (name, value) = parse_register("%t:2024")?;
    let config = base()?
        .projection(parse_projection("%t;0;2")?)
        .register(name, value)
        .build()?;
    assert_eq!(
        config.projection,
        vec![
            ProjectionToken::Register("2024".to_string()),
            ProjectionToken::Key(0),
            ProjectionToken::Sum(0),
        ]
    );
    assert_eq!(config.required_fields(), 3);
    Ok(())
}

#[test]
fn test_malformed_index_lists() {
    assert!("1-x".parse::<FieldIndexSet>().is_err());
    assert!("5-2".parse::<FieldIndexSet>().is_err());
    assert!(parse_projection("%").is_err());
}

#[test]
fn test_dry_run_never_writes_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_sample(dir.path(), "in.csv")?;
    let out = dir.path().join("out.csv");
    let builder = AggregateConfig::builder()
        .key_fields("0".parse()?)
        .sum_fields("2".parse()?)
        .projection(parse_projection("0;2")?)
        .input(&input)
        .output_file(&out);

    let report = DryRunReport::inspect(&builder)?;
    assert_eq!(report.field_count, 3);
    assert_eq!(report.unprojected, vec![1]);
    assert!(!report.has_problems());
    assert!(report.to_string().contains("Reading file:"));
    assert!(!out.exists());
    Ok(())
}
