//! Resolved configuration for one aggregation run.
//!
//! The CLI (or any other front end) collects raw option text, parses it with
//! the helpers in this module, and hands the pieces to
//! [`AggregateConfig::builder`]. [`AggregateConfigBuilder::build`] validates
//! everything once, so the engine never has to re-check configuration while
//! streaming.
//!
//! # Example
//!
//! ```
//! use ironsum::config::{AggregateConfig, FieldIndexSet, parse_projection};
//!
//! let config = AggregateConfig::builder()
//!     .key_fields("0".parse::<FieldIndexSet>()?)
//!     .sum_fields("2".parse::<FieldIndexSet>()?)
//!     .projection(parse_projection("%t;0;2")?)
//!     .register("t", "2024")
//!     .input("data.csv")
//!     .build()?;
//!
//! assert_eq!(config.required_fields(), 3);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::ConfigError;
use crate::projection::ProjectionToken;
use regex::Regex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

/// Prefix that marks a projection token as a register reference.
pub const REGISTER_MARKER: char = '%';

/// Default "no value" sentinel.
pub const DEFAULT_NO_VALUE: i64 = -1;

/// Default output path, matching the historical tool.
pub const DEFAULT_OUTPUT_FILE: &str = "out.csv";

/// Largest field ordinal accepted in an index set or projection.
pub const MAX_FIELD_ORDINAL: usize = u16::MAX as usize;

static INDEX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").expect("static index regex")
});

static REGISTER_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%?([^:]*):(.*)$").expect("static register regex")
});

/* ===================== Field index sets ===================== */

/// An ordered set of field ordinals, e.g. `"2-20"` or `"1;3;5"`.
///
/// The position of an ordinal inside the set is its *dense position*: the
/// slot it occupies in a group's key or sum array. Dense positions follow
/// declaration order, and a repeated ordinal keeps its first position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldIndexSet {
    ordinals: Vec<usize>,
    positions: HashMap<usize, usize>,
}

impl FieldIndexSet {
    /// Build a set from ordinals in declaration order, dropping repeats.
    pub fn from_ordinals<I: IntoIterator<Item = usize>>(ordinals: I) -> Self {
        let mut set = Self::default();
        for ord in ordinals {
            let next = set.ordinals.len();
            if let Entry::Vacant(slot) = set.positions.entry(ord) {
                slot.insert(next);
                set.ordinals.push(ord);
            }
        }
        set
    }

    /// Ordinals in dense-position order.
    pub fn ordinals(&self) -> &[usize] {
        &self.ordinals
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    /// Dense position of `ordinal`, if it belongs to the set.
    pub fn position(&self, ordinal: usize) -> Option<usize> {
        self.positions.get(&ordinal).copied()
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        self.positions.contains_key(&ordinal)
    }

    pub fn max_ordinal(&self) -> Option<usize> {
        self.ordinals.iter().copied().max()
    }
}

impl FromStr for FieldIndexSet {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut ordinals = Vec::new();
        for token in text.split(';').filter(|t| !t.trim().is_empty()) {
            expand_index_token(token, &mut ordinals)?;
        }
        Ok(Self::from_ordinals(ordinals))
    }
}

impl fmt::Display for FieldIndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ordinals.iter().map(|o| o.to_string()).collect();
        write!(f, "{}", parts.join(";"))
    }
}

/// Expand one `N` or `A-B` token, appending to `out`.
///
/// Ordinals above [`MAX_FIELD_ORDINAL`] are rejected before anything is
/// expanded.
fn expand_index_token(token: &str, out: &mut Vec<usize>) -> Result<(), ConfigError> {
    let token = token.trim();
    let caps = INDEX_TOKEN
        .captures(token)
        .ok_or_else(|| ConfigError::BadIndexToken(token.to_string()))?;
    let ordinal = |text: &str| -> Result<usize, ConfigError> {
        text.parse::<usize>()
            .ok()
            .filter(|&o| o <= MAX_FIELD_ORDINAL)
            .ok_or_else(|| ConfigError::OrdinalTooLarge(token.to_string()))
    };
    let start = ordinal(&caps[1])?;
    match caps.get(2) {
        None => out.push(start),
        Some(end) => {
            let end = ordinal(end.as_str())?;
            if start > end {
                return Err(ConfigError::BadRange(token.to_string()));
            }
            out.extend(start..=end);
        }
    }
    Ok(())
}

/* ===================== Projection text ===================== */

/// One unresolved projection entry, as written by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectionItem {
    /// `%name`, stored without the marker.
    Register(String),
    /// A field ordinal; resolved later against the key and sum sets.
    Ordinal(usize),
}

/// Parse a projection list such as `"%t;1-35"`.
///
/// Ranges expand into individual ordinals. Unlike a [`FieldIndexSet`],
/// repeats are kept: projecting the same column twice is legitimate.
pub fn parse_projection(text: &str) -> Result<Vec<ProjectionItem>, ConfigError> {
    let mut items = Vec::new();
    for token in text.split(';').filter(|t| !t.trim().is_empty()) {
        let trimmed = token.trim();
        if let Some(name) = trimmed.strip_prefix(REGISTER_MARKER) {
            if name.is_empty() {
                return Err(ConfigError::EmptyRegisterName);
            }
            items.push(ProjectionItem::Register(name.to_string()));
        } else {
            let mut ordinals = Vec::new();
            expand_index_token(trimmed, &mut ordinals)?;
            items.extend(ordinals.into_iter().map(ProjectionItem::Ordinal));
        }
    }
    Ok(items)
}

/// Parse a register definition `NAME:VALUE` (the `%` on `NAME` is optional).
///
/// Only the first `:` splits; the value may contain more of them.
pub fn parse_register(text: &str) -> Result<(String, String), ConfigError> {
    let caps = REGISTER_DEF
        .captures(text)
        .ok_or_else(|| ConfigError::BadRegister(text.to_string()))?;
    let name = caps[1].trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyRegisterName);
    }
    Ok((name.to_string(), caps[2].to_string()))
}

/* ===================== Separators ===================== */

fn unescape_separator(text: &str) -> String {
    match text {
        "\\t" | "tab" => "\t".to_string(),
        "\\0" => "\0".to_string(),
        "\\\\" => "\\".to_string(),
        "comma" => ",".to_string(),
        "semicolon" => ";".to_string(),
        "pipe" => "|".to_string(),
        "space" => " ".to_string(),
        other => other.to_string(),
    }
}

/// Resolve an input separator; it must be exactly one byte.
pub fn parse_input_separator(text: &str) -> Result<u8, ConfigError> {
    match unescape_separator(text).as_bytes() {
        [b] => Ok(*b),
        _ => Err(ConfigError::BadSeparator(text.to_string())),
    }
}

/// Resolve an output separator; any string is accepted.
pub fn parse_output_separator(text: &str) -> String {
    unescape_separator(text)
}

/* ===================== Policies ===================== */

/// What to do with sum-field text that is not an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Record a warning and treat the observation as absent.
    #[default]
    Strict,
    /// Silently read the text as 0, like the historical tool.
    LegacyZero,
}

/// How the field splitter treats the remainder after the last separator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitMode {
    /// N separators always produce N+1 fields.
    #[default]
    Uniform,
    /// A trailing remainder of one byte or less becomes an empty field.
    Legacy,
}

/// What identifies a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyIdentity {
    /// Fingerprint plus a byte-wise comparison of the stored key tuple.
    #[default]
    Verified,
    /// Fingerprint alone; colliding key tuples merge silently.
    TrustHash,
}

/* ===================== AggregateConfig ===================== */

/// Fully validated configuration consumed by the engine.
#[derive(Clone, Debug)]
pub struct AggregateConfig {
    pub key_fields: FieldIndexSet,
    pub sum_fields: FieldIndexSet,
    pub projection: Vec<ProjectionToken>,
    pub input_separator: u8,
    pub output_separator: String,
    pub no_value: i64,
    pub skip_lines: usize,
    pub inputs: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub output_header: Option<String>,
    pub parse_policy: ParsePolicy,
    pub split_mode: SplitMode,
    pub key_identity: KeyIdentity,
    pub key_separator: Option<u8>,
    pub sort_output: bool,
}

impl AggregateConfig {
    pub fn builder() -> AggregateConfigBuilder {
        AggregateConfigBuilder::default()
    }

    /// Minimum number of fields a record needs to be aggregated.
    pub fn required_fields(&self) -> usize {
        self.key_fields
            .max_ordinal()
            .into_iter()
            .chain(self.sum_fields.max_ordinal())
            .max()
            .map_or(0, |m| m + 1)
    }
}

/// Collects raw configuration; [`build`](Self::build) validates it.
#[derive(Clone, Debug)]
pub struct AggregateConfigBuilder {
    key_fields: FieldIndexSet,
    sum_fields: FieldIndexSet,
    projection: Vec<ProjectionItem>,
    registers: HashMap<String, String>,
    input_separator: u8,
    output_separator: String,
    no_value: i64,
    skip_lines: usize,
    inputs: Vec<PathBuf>,
    output_file: PathBuf,
    output_header: Option<String>,
    parse_policy: ParsePolicy,
    split_mode: SplitMode,
    key_identity: KeyIdentity,
    key_separator: Option<u8>,
    sort_output: bool,
}

impl Default for AggregateConfigBuilder {
    fn default() -> Self {
        Self {
            key_fields: FieldIndexSet::default(),
            sum_fields: FieldIndexSet::default(),
            projection: Vec::new(),
            registers: HashMap::new(),
            input_separator: b',',
            output_separator: ",".to_string(),
            no_value: DEFAULT_NO_VALUE,
            skip_lines: 0,
            inputs: Vec::new(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            output_header: None,
            parse_policy: ParsePolicy::default(),
            split_mode: SplitMode::default(),
            key_identity: KeyIdentity::default(),
            key_separator: None,
            sort_output: false,
        }
    }
}

impl AggregateConfigBuilder {
    pub fn key_fields(mut self, set: FieldIndexSet) -> Self {
        self.key_fields = set;
        self
    }

    pub fn sum_fields(mut self, set: FieldIndexSet) -> Self {
        self.sum_fields = set;
        self
    }

    pub fn projection(mut self, items: Vec<ProjectionItem>) -> Self {
        self.projection = items;
        self
    }

    /// Define a register; a leading `%` on `name` is ignored.
    pub fn register(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix(REGISTER_MARKER).unwrap_or(&name).to_string();
        self.registers.insert(name, value.into());
        self
    }

    pub fn input_separator(mut self, sep: u8) -> Self {
        self.input_separator = sep;
        self
    }

    pub fn output_separator(mut self, sep: impl Into<String>) -> Self {
        self.output_separator = sep.into();
        self
    }

    pub fn no_value(mut self, sentinel: i64) -> Self {
        self.no_value = sentinel;
        self
    }

    pub fn skip_lines(mut self, n: usize) -> Self {
        self.skip_lines = n;
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = path.into();
        self
    }

    /// Header line written verbatim before any group. Empty means none.
    pub fn output_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        self.output_header = (!header.is_empty()).then_some(header);
        self
    }

    pub fn parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    pub fn split_mode(mut self, mode: SplitMode) -> Self {
        self.split_mode = mode;
        self
    }

    pub fn key_identity(mut self, identity: KeyIdentity) -> Self {
        self.key_identity = identity;
        self
    }

    pub fn key_separator(mut self, sep: Option<u8>) -> Self {
        self.key_separator = sep;
        self
    }

    pub fn sort_output(mut self, sort: bool) -> Self {
        self.sort_output = sort;
        self
    }

    pub fn key_field_set(&self) -> &FieldIndexSet {
        &self.key_fields
    }

    pub fn sum_field_set(&self) -> &FieldIndexSet {
        &self.sum_fields
    }

    pub fn projection_items(&self) -> &[ProjectionItem] {
        &self.projection
    }

    pub fn registers(&self) -> &HashMap<String, String> {
        &self.registers
    }

    pub fn input_paths(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn input_separator_byte(&self) -> u8 {
        self.input_separator
    }

    pub fn header(&self) -> Option<&str> {
        self.output_header.as_deref()
    }

    /// Checks shared by [`build`](Self::build) and the dry run: every list
    /// must be non-empty and at least one input must be present.
    pub fn check_required(&self) -> Result<(), ConfigError> {
        if self.projection.is_empty() {
            return Err(ConfigError::EmptyProjection);
        }
        if self.sum_fields.is_empty() {
            return Err(ConfigError::EmptySumFields);
        }
        if self.key_fields.is_empty() {
            return Err(ConfigError::EmptyKeyFields);
        }
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputFiles);
        }
        Ok(())
    }

    /// Validate and resolve the projection against the key/sum sets and the
    /// register table.
    ///
    /// An ordinal that is both a key and a sum field projects the sum.
    pub fn build(self) -> Result<AggregateConfig, ConfigError> {
        self.check_required()?;

        let mut projection = Vec::with_capacity(self.projection.len());
        for item in &self.projection {
            let token = match item {
                ProjectionItem::Register(name) => {
                    let text = self
                        .registers
                        .get(name)
                        .ok_or_else(|| ConfigError::UndefinedRegister(name.clone()))?;
                    ProjectionToken::Register(text.clone())
                }
                ProjectionItem::Ordinal(ord) => {
                    if let Some(pos) = self.sum_fields.position(*ord) {
                        ProjectionToken::Sum(pos)
                    } else if let Some(pos) = self.key_fields.position(*ord) {
                        ProjectionToken::Key(pos)
                    } else {
                        return Err(ConfigError::UnknownProjectionOrdinal(*ord));
                    }
                }
            };
            projection.push(token);
        }

        Ok(AggregateConfig {
            key_fields: self.key_fields,
            sum_fields: self.sum_fields,
            projection,
            input_separator: self.input_separator,
            output_separator: self.output_separator,
            no_value: self.no_value,
            skip_lines: self.skip_lines,
            inputs: self.inputs,
            output_file: self.output_file,
            output_header: self.output_header,
            parse_policy: self.parse_policy,
            split_mode: self.split_mode,
            key_identity: self.key_identity,
            key_separator: self.key_separator,
            sort_output: self.sort_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_set_expands_ranges_in_declaration_order() {
        let set: FieldIndexSet = "5;1-3;0".parse().unwrap();
        assert_eq!(set.ordinals(), &[5, 1, 2, 3, 0]);
        assert_eq!(set.position(2), Some(2));
        assert_eq!(set.max_ordinal(), Some(5));
        assert_eq!(set.to_string(), "5;1;2;3;0");
    }

    #[test]
    fn index_set_keeps_first_position_of_repeats() {
        let set: FieldIndexSet = "1;2;1".parse().unwrap();
        assert_eq!(set.ordinals(), &[1, 2]);
    }

    #[test]
    fn index_set_rejects_garbage_and_reversed_ranges() {
        assert_eq!(
            "1;x".parse::<FieldIndexSet>(),
            Err(ConfigError::BadIndexToken("x".into()))
        );
        assert_eq!(
            "9-2".parse::<FieldIndexSet>(),
            Err(ConfigError::BadRange("9-2".into()))
        );
    }

    #[test]
    fn index_set_rejects_huge_ordinals_without_expanding() {
        assert_eq!(
            "0-18446744073709551615".parse::<FieldIndexSet>(),
            Err(ConfigError::OrdinalTooLarge("0-18446744073709551615".into()))
        );
        assert_eq!(
            "99999999999999999999999".parse::<FieldIndexSet>(),
            Err(ConfigError::OrdinalTooLarge("99999999999999999999999".into()))
        );
        assert!(parse_projection("0-99999999999").is_err());

        let widest: FieldIndexSet = format!("0-{MAX_FIELD_ORDINAL};3").parse().unwrap();
        assert_eq!(widest.len(), MAX_FIELD_ORDINAL + 1);
        assert_eq!(widest.position(3), Some(3));
        assert_eq!(widest.position(MAX_FIELD_ORDINAL), Some(MAX_FIELD_ORDINAL));
    }

    #[test]
    fn projection_keeps_registers_and_repeats() {
        let items = parse_projection("%t; 0;0;2-3").unwrap();
        assert_eq!(
            items,
            vec![
                ProjectionItem::Register("t".into()),
                ProjectionItem::Ordinal(0),
                ProjectionItem::Ordinal(0),
                ProjectionItem::Ordinal(2),
                ProjectionItem::Ordinal(3),
            ]
        );
    }

    #[test]
    fn register_definition_splits_on_first_colon() {
        assert_eq!(
            parse_register("%t:12:30").unwrap(),
            ("t".to_string(), "12:30".to_string())
        );
        assert_eq!(parse_register("year:").unwrap(), ("year".into(), String::new()));
        assert!(parse_register("novalue").is_err());
        assert_eq!(parse_register("%:x"), Err(ConfigError::EmptyRegisterName));
    }

    #[test]
    fn separators_accept_escapes() {
        assert_eq!(parse_input_separator(",").unwrap(), b',');
        assert_eq!(parse_input_separator("\\t").unwrap(), b'\t');
        assert_eq!(parse_input_separator("pipe").unwrap(), b'|');
        assert!(parse_input_separator(",,").is_err());
        assert!(parse_input_separator("").is_err());
        assert_eq!(parse_output_separator("tab"), "\t");
        assert_eq!(parse_output_separator("::"), "::");
    }

    fn base() -> AggregateConfigBuilder {
        AggregateConfig::builder()
            .key_fields("0;1".parse().unwrap())
            .sum_fields("2-3".parse().unwrap())
            .input("in.csv")
    }

    #[test]
    fn build_resolves_projection_tokens() {
        let config = base()
            .projection(parse_projection("%t;1;3;0").unwrap())
            .register("%t", "2024")
            .build()
            .unwrap();
        assert_eq!(
            config.projection,
            vec![
                ProjectionToken::Register("2024".into()),
                ProjectionToken::Key(1),
                ProjectionToken::Sum(1),
                ProjectionToken::Key(0),
            ]
        );
        assert_eq!(config.required_fields(), 4);
    }

    #[test]
    fn build_reports_missing_pieces_in_order() {
        let err = AggregateConfig::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyProjection);

        let err = base()
            .projection(parse_projection("%x").unwrap())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UndefinedRegister("x".into()));

        let err = base()
            .projection(parse_projection("7").unwrap())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownProjectionOrdinal(7));

        let err = AggregateConfig::builder()
            .key_fields("0".parse().unwrap())
            .sum_fields("1".parse().unwrap())
            .projection(parse_projection("0").unwrap())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoInputFiles);
    }

    #[test]
    fn empty_header_means_none() {
        let config = base()
            .projection(parse_projection("0").unwrap())
            .output_header("")
            .build()
            .unwrap();
        assert_eq!(config.output_header, None);
    }
}
