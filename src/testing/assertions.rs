//! Assertion functions for comparing output rows.

use std::collections::HashMap;

/// Assert that two row lists hold the same rows, ignoring order.
///
/// Duplicated rows must appear the same number of times on both sides.
///
/// # Panics
///
/// Panics if the row multisets differ.
///
/// # Example
///
/// ```
/// use ironsum::testing::assert_rows_unordered_equal;
///
/// let actual = vec!["B,-1".to_string(), "A,30".to_string()];
/// assert_rows_unordered_equal(&actual, &["A,30", "B,-1"]);
/// ```
pub fn assert_rows_unordered_equal<A: AsRef<str>, E: AsRef<str>>(actual: &[A], expected: &[E]) {
    let actual_counts = row_counts(actual);
    let expected_counts = row_counts(expected);

    if actual_counts != expected_counts {
        let mut missing: Vec<&str> = expected_counts
            .iter()
            .filter(|(row, n)| actual_counts.get(*row).copied().unwrap_or(0) < **n)
            .map(|(row, _)| *row)
            .collect();
        let mut extra: Vec<&str> = actual_counts
            .iter()
            .filter(|(row, n)| expected_counts.get(*row).copied().unwrap_or(0) < **n)
            .map(|(row, _)| *row)
            .collect();
        missing.sort_unstable();
        extra.sort_unstable();
        panic!(
            "Row mismatch:\n  Missing rows: {missing:?}\n  Extra rows: {extra:?}\n  Expected: {:?}\n  Actual: {:?}",
            as_strs(expected),
            as_strs(actual),
        );
    }
}

/// Assert that `rows` contains a row equal to `row`.
///
/// # Panics
///
/// Panics if no row matches.
pub fn assert_has_row<A: AsRef<str>>(rows: &[A], row: &str) {
    assert!(
        rows.iter().any(|r| r.as_ref() == row),
        "Row {row:?} not found in {:?}",
        as_strs(rows)
    );
}

fn row_counts<S: AsRef<str>>(rows: &[S]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.as_ref()).or_insert(0) += 1;
    }
    counts
}

fn as_strs<S: AsRef<str>>(rows: &[S]) -> Vec<&str> {
    rows.iter().map(|r| r.as_ref()).collect()
}
