//! Zero-copy field splitting.
//!
//! A record is cut on every occurrence of a single separator byte. There is
//! no quoting and no escaping: a separator byte always ends a field.
//!
//! ```
//! use ironsum::split::FieldSplitter;
//! use ironsum::config::SplitMode;
//!
//! let mut splitter = FieldSplitter::new(b',', SplitMode::Uniform);
//! let fields = splitter.split(b"A,1,");
//! assert_eq!(fields, [b"A".as_slice(), b"1", b""]);
//! ```

use crate::config::SplitMode;
use memchr::memchr_iter;

/// Splits records into borrowed fields.
///
/// The splitter remembers how many fields the previous record had and uses
/// that as the capacity of the next field list, so steady-state splitting
/// allocates exactly once per record.
#[derive(Debug, Clone)]
pub struct FieldSplitter {
    separator: u8,
    mode: SplitMode,
    capacity_hint: usize,
}

impl FieldSplitter {
    pub fn new(separator: u8, mode: SplitMode) -> Self {
        Self {
            separator,
            mode,
            capacity_hint: 0,
        }
    }

    /// Field count of the most recent record (0 before the first split).
    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Split `record` into its fields.
    ///
    /// In [`SplitMode::Uniform`], a record with N separators yields exactly
    /// N+1 fields, including an empty trailing field when the record ends
    /// with the separator.
    ///
    /// In [`SplitMode::Legacy`], a trailing remainder of length 0 or 1 is
    /// replaced by an empty field, so `"A,1,5"` ends in `""` instead of
    /// `"5"`. Only use it to reproduce output of the historical tool.
    pub fn split<'a>(&mut self, record: &'a [u8]) -> Vec<&'a [u8]> {
        let mut fields = Vec::with_capacity(self.capacity_hint);
        let mut start = 0;
        for pos in memchr_iter(self.separator, record) {
            fields.push(&record[start..pos]);
            start = pos + 1;
        }
        let rest = &record[start..];
        match self.mode {
            SplitMode::Uniform => fields.push(rest),
            SplitMode::Legacy if rest.len() > 1 => fields.push(rest),
            SplitMode::Legacy => fields.push(&record[record.len()..]),
        }
        self.capacity_hint = fields.len();
        fields
    }
}
