//! Null-aware combiners.
//!
//! A sum field distinguishes "observed 0" from "not observed at all". Each
//! observation is a [`SumValue`]; combining two of them never lets an absent
//! observation drag a present one back to invalid.

/// An aggregation function split into its four phases.
///
/// - `create` makes an empty accumulator
/// - `add_input` folds one input into an accumulator
/// - `merge` folds one accumulator into another
/// - `finish` turns an accumulator into the output
pub trait CombineFn<V, A, O> {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: V);
    fn merge(&self, acc: &mut A, other: A);
    fn finish(&self, acc: A) -> O;
}

/* ===================== SumValue ===================== */

/// An accumulated integer plus whether anything was ever observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SumValue {
    pub value: i64,
    pub valid: bool,
}

impl SumValue {
    /// An absent observation.
    pub const ABSENT: SumValue = SumValue {
        value: 0,
        valid: false,
    };

    pub fn present(value: i64) -> Self {
        Self { value, valid: true }
    }

    /// Combine two observations of the same field.
    ///
    /// | self  | other | result            |
    /// |-------|-------|-------------------|
    /// | valid | valid | sum, valid        |
    /// | valid | absent| self              |
    /// | absent| valid | other             |
    /// | absent| absent| absent            |
    ///
    /// Addition wraps on overflow.
    #[inline]
    pub fn combine(self, other: SumValue) -> SumValue {
        match (self.valid, other.valid) {
            (true, true) => SumValue::present(self.value.wrapping_add(other.value)),
            (true, false) => self,
            (false, true) => other,
            (false, false) => SumValue::ABSENT,
        }
    }

    /// The value, or `None` when nothing was observed.
    pub fn get(self) -> Option<i64> {
        self.valid.then_some(self.value)
    }
}

/* ===================== NullAwareSum ===================== */

/// Sum that ignores absent observations.
///
/// - Accumulator: [`SumValue`]
/// - Output: `Option<i64>` (`None` when every observation was absent)
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAwareSum;

impl CombineFn<SumValue, SumValue, Option<i64>> for NullAwareSum {
    fn create(&self) -> SumValue {
        SumValue::ABSENT
    }

    fn add_input(&self, acc: &mut SumValue, v: SumValue) {
        *acc = acc.combine(v);
    }

    fn merge(&self, acc: &mut SumValue, other: SumValue) {
        *acc = acc.combine(other);
    }

    fn finish(&self, acc: SumValue) -> Option<i64> {
        acc.get()
    }
}

impl NullAwareSum {
    /// Fold a group of row values position-wise into `acc`.
    pub fn add_row(&self, acc: &mut [SumValue], row: &[SumValue]) {
        for (a, &b) in acc.iter_mut().zip(row) {
            self.add_input(a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: SumValue = SumValue {
        value: 5,
        valid: true,
    };
    const B: SumValue = SumValue {
        value: -2,
        valid: true,
    };

    #[test]
    fn merge_table() {
        assert_eq!(A.combine(B), SumValue::present(3));
        assert_eq!(A.combine(SumValue::ABSENT), A);
        assert_eq!(SumValue::ABSENT.combine(B), B);
        assert_eq!(SumValue::ABSENT.combine(SumValue::ABSENT), SumValue::ABSENT);
    }

    #[test]
    fn combine_is_commutative_and_associative() {
        let values = [A, B, SumValue::ABSENT, SumValue::present(0), SumValue::present(i64::MAX)];
        for &x in &values {
            for &y in &values {
                assert_eq!(x.combine(y), y.combine(x));
                for &z in &values {
                    assert_eq!(x.combine(y).combine(z), x.combine(y.combine(z)));
                }
            }
        }
    }

    #[test]
    fn null_aware_sum_finishes_to_none_when_all_absent() {
        let sum = NullAwareSum;
        let mut acc = sum.create();
        sum.add_input(&mut acc, SumValue::ABSENT);
        sum.add_input(&mut acc, SumValue::ABSENT);
        assert_eq!(sum.finish(acc), None);

        sum.add_input(&mut acc, SumValue::present(0));
        assert_eq!(sum.finish(acc), Some(0));
    }

    #[test]
    fn add_row_is_position_wise() {
        let mut acc = vec![SumValue::present(1), SumValue::ABSENT];
        NullAwareSum.add_row(&mut acc, &[SumValue::ABSENT, SumValue::present(4)]);
        assert_eq!(acc, vec![SumValue::present(1), SumValue::present(4)]);
    }
}
