//! Group key fingerprinting.
//!
//! A group's fingerprint is the xxHash64 (seed 0) of its key fields' raw
//! bytes, fed in declared order. By default nothing is fed between fields,
//! so `("ab", "c")` and `("a", "bc")` share a fingerprint. In
//! [`KeyIdentity::Verified`](crate::config::KeyIdentity::Verified) mode the
//! accumulator tells them apart anyway by comparing the stored key tuple;
//! in `TrustHash` mode they merge. Setting a key separator removes the
//! concatenation ambiguity from the fingerprint itself.

use xxhash_rust::xxh64::Xxh64;

const SEED: u64 = 0;

/// Computes fingerprints over the configured key ordinals.
pub struct KeyBuilder {
    ordinals: Vec<usize>,
    separator: Option<u8>,
    state: Xxh64,
}

impl KeyBuilder {
    pub fn new(ordinals: &[usize], separator: Option<u8>) -> Self {
        Self {
            ordinals: ordinals.to_vec(),
            separator,
            state: Xxh64::new(SEED),
        }
    }

    /// Fingerprint of the key fields of `fields`.
    ///
    /// Missing ordinals hash as empty fields; callers reject short records
    /// before they get here.
    pub fn fingerprint(&mut self, fields: &[&[u8]]) -> u64 {
        self.state.reset(SEED);
        for (i, &ord) in self.ordinals.iter().enumerate() {
            if i > 0
                && let Some(sep) = self.separator
            {
                self.state.update(&[sep]);
            }
            self.state.update(fields.get(ord).copied().unwrap_or_default());
        }
        self.state.digest()
    }
}

/// Copy the key fields out of a record into owned storage.
pub fn materialize_keys(fields: &[&[u8]], ordinals: &[usize]) -> Box<[Box<[u8]>]> {
    ordinals
        .iter()
        .map(|&ord| Box::from(fields.get(ord).copied().unwrap_or_default()))
        .collect()
}

/// Whether a stored key tuple equals the key fields of `fields`.
pub fn keys_match(stored: &[Box<[u8]>], fields: &[&[u8]], ordinals: &[usize]) -> bool {
    stored.len() == ordinals.len()
        && stored
            .iter()
            .zip(ordinals)
            .all(|(s, &ord)| **s == *fields.get(ord).copied().unwrap_or_default())
}
