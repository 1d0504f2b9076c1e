//! Typed configuration errors.
//!
//! Everything that can go wrong *before* the first record is read lives here.
//! IO failures and per-record problems are reported elsewhere: IO through
//! `anyhow` context chains, record problems through
//! [`ErrorCollector`](crate::validation::ErrorCollector).

use thiserror::Error;

/// A configuration problem detected before any input is processed.
///
/// All variants are fatal: the caller is expected to report them and exit
/// with a non-zero status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Key fields list is empty!")]
    EmptyKeyFields,

    #[error("Aggregation fields list is empty!")]
    EmptySumFields,

    #[error("Projection fields list is empty!")]
    EmptyProjection,

    #[error("No files selected")]
    NoInputFiles,

    #[error("invalid field index token '{0}' (expected N or A-B)")]
    BadIndexToken(String),

    #[error("invalid field range '{0}': start is greater than end")]
    BadRange(String),

    #[error("field ordinal in '{0}' is larger than {max}", max = crate::config::MAX_FIELD_ORDINAL)]
    OrdinalTooLarge(String),

    #[error("projection ordinal {0} is neither a key field nor a sum field")]
    UnknownProjectionOrdinal(usize),

    #[error("register %{0} used but not initialized")]
    UndefinedRegister(String),

    #[error("invalid register definition '{0}' (expected NAME:VALUE)")]
    BadRegister(String),

    #[error("register name must not be empty")]
    EmptyRegisterName,

    #[error("invalid separator '{0}': input separator must be exactly one byte")]
    BadSeparator(String),
}
