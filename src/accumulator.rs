//! The in-memory group table.
//!
//! Groups are found by fingerprint. Each fingerprint owns a small bucket of
//! [`GroupEntry`] values; with [`KeyIdentity::Verified`] a bucket holds one
//! entry per distinct key tuple that hashed to the fingerprint, with
//! [`KeyIdentity::TrustHash`] it never holds more than one.
//!
//! Memory grows with the number of distinct groups and is never released
//! before the run ends.

use crate::combiners::{NullAwareSum, SumValue};
use crate::config::{KeyIdentity, ParsePolicy};
use crate::key::{keys_match, materialize_keys};
use std::collections::HashMap;

/// One aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    keys: Box<[Box<[u8]>]>,
    sums: Vec<SumValue>,
}

impl GroupEntry {
    /// Key field bytes in key dense-position order, as first seen.
    pub fn keys(&self) -> &[Box<[u8]>] {
        &self.keys
    }

    pub fn key(&self, pos: usize) -> &[u8] {
        &self.keys[pos]
    }

    pub fn sum(&self, pos: usize) -> SumValue {
        self.sums[pos]
    }
}

/// A sum field whose text was not an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    pub ordinal: usize,
    pub text: String,
}

/// Parse a signed decimal integer with an optional `+`/`-` sign.
///
/// Returns `None` on empty input, stray bytes, or overflow.
pub fn parse_i64(text: &[u8]) -> Option<i64> {
    let (negative, digits) = match text.split_first()? {
        (b'-', rest) => (true, rest),
        (b'+', rest) => (false, rest),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }
    let mut acc: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        let d = i64::from(b - b'0');
        acc = if negative {
            acc.checked_mul(10)?.checked_sub(d)?
        } else {
            acc.checked_mul(10)?.checked_add(d)?
        };
    }
    Some(acc)
}

/// Sum-field text that is not an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAnInteger;

/// Turn one sum field's text into an observation.
///
/// The sentinel maps to an absent observation. Under
/// [`ParsePolicy::Strict`] unparseable text is absent and reported through
/// `Err`; empty text is absent without a report. Under
/// [`ParsePolicy::LegacyZero`] anything unparseable reads as 0.
pub fn observe(text: &[u8], no_value: i64, policy: ParsePolicy) -> Result<SumValue, NotAnInteger> {
    let parsed = match (parse_i64(text), policy) {
        (Some(n), _) => n,
        (None, ParsePolicy::LegacyZero) => 0,
        (None, ParsePolicy::Strict) if text.is_empty() => return Ok(SumValue::ABSENT),
        (None, ParsePolicy::Strict) => return Err(NotAnInteger),
    };
    if parsed == no_value {
        Ok(SumValue::ABSENT)
    } else {
        Ok(SumValue::present(parsed))
    }
}

/// Fingerprint → group table with the null-aware merge rule.
pub struct Accumulator {
    groups: HashMap<u64, Vec<GroupEntry>>,
    key_ordinals: Vec<usize>,
    sum_ordinals: Vec<usize>,
    no_value: i64,
    policy: ParsePolicy,
    identity: KeyIdentity,
    partial: Vec<SumValue>,
    len: usize,
    collisions: usize,
}

impl Accumulator {
    pub fn new(
        key_ordinals: &[usize],
        sum_ordinals: &[usize],
        no_value: i64,
        policy: ParsePolicy,
        identity: KeyIdentity,
    ) -> Self {
        Self {
            groups: HashMap::new(),
            key_ordinals: key_ordinals.to_vec(),
            sum_ordinals: sum_ordinals.to_vec(),
            no_value,
            policy,
            identity,
            partial: vec![SumValue::ABSENT; sum_ordinals.len()],
            len: 0,
            collisions: 0,
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distinct key tuples that shared a fingerprint with an earlier group.
    ///
    /// Always 0 under [`KeyIdentity::TrustHash`], where such tuples merge.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Fold one record into the group identified by `fingerprint`.
    ///
    /// `fields` must contain every configured key and sum ordinal. Sum
    /// fields that fail to parse are appended to `warnings` and count as
    /// absent for this record.
    pub fn merge(&mut self, fingerprint: u64, fields: &[&[u8]], warnings: &mut Vec<FieldWarning>) {
        let Self {
            groups,
            key_ordinals,
            sum_ordinals,
            no_value,
            policy,
            identity,
            partial,
            len,
            collisions,
        } = self;

        for (slot, &ord) in partial.iter_mut().zip(sum_ordinals.iter()) {
            let text = fields.get(ord).copied().unwrap_or_default();
            *slot = match observe(text, *no_value, *policy) {
                Ok(v) => v,
                Err(NotAnInteger) => {
                    warnings.push(FieldWarning {
                        ordinal: ord,
                        text: String::from_utf8_lossy(text).into_owned(),
                    });
                    SumValue::ABSENT
                }
            };
        }

        let bucket = groups.entry(fingerprint).or_default();
        let existing = match identity {
            KeyIdentity::TrustHash => bucket.first_mut(),
            KeyIdentity::Verified => bucket
                .iter_mut()
                .find(|g| keys_match(&g.keys, fields, key_ordinals)),
        };
        match existing {
            Some(group) => NullAwareSum.add_row(&mut group.sums, partial),
            None => {
                if !bucket.is_empty() {
                    *collisions += 1;
                }
                bucket.push(GroupEntry {
                    keys: materialize_keys(fields, key_ordinals),
                    sums: partial.clone(),
                });
                *len += 1;
            }
        }
    }

    /// Iterate over all groups in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupEntry> {
        self.groups.values().flatten()
    }

    /// Look up the group whose key tuple equals `keys`.
    pub fn find(&self, keys: &[&[u8]]) -> Option<&GroupEntry> {
        self.iter()
            .find(|g| g.keys().len() == keys.len() && g.keys().iter().zip(keys).all(|(a, b)| **a == **b))
    }
}
