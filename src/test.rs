#![cfg(test)]

use std::ops::Range;

use rand::prelude::*;
use rand::rngs::SmallRng;

use crate::Bitset;

/// The type of operation to perform
#[derive(Clone, Copy, Debug)]
pub(crate) enum OpType {
    /// Performs a union of the two input sets
    Or,

    /// Performs an intersection of the two input sets
    And,

    /// Peforms a difference between the two input sets
    AndNot,
}

/// Seed used for the first operand of a test
pub(crate) const SEED_A: u64 = 0x0304_0106_0308_0600;

/// Seed used for the second operand of a test
pub(crate) const SEED_B: u64 = 0x0905_0407_0608_0102;

/// Generates up to `count` random values in `range`. Values are deduplicated and sorted
pub(crate) fn generate_data(range: Range<usize>, count: usize) -> Vec<usize> {
    generate_seeded_data(range, count, SEED_A)
}

/// Same as `generate_data` with an explicit seed
pub(crate) fn generate_seeded_data(range: Range<usize>, count: usize, seed: u64) -> Vec<usize> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut result = Vec::with_capacity(count);

    if range.start < range.end {
        while result.len() < count {
            result.push(rng.gen_range(range.start..range.end));
        }
    }

    result.sort_unstable();
    result.dedup();

    result
}

/// Compute the result of an operation on two input sets using a known correct algorithm
///
/// # Remarks
/// Assumes the inputs are sorted
pub(crate) fn compute_result(a: &[usize], b: &[usize], op: OpType) -> Vec<usize> {
    match op {
        OpType::Or => {
            // Compute A + B - Duplicates and maintain sorting
            let mut result = Vec::with_capacity(a.len() + b.len());
            result.extend_from_slice(a);
            result.extend_from_slice(b);
            result.sort_unstable();
            result.dedup();

            result
        },
        OpType::And => {
            let mut result = Vec::with_capacity(a.len().min(b.len()));

            let mut i0 = 0;
            let mut i1 = 0;
            while i0 < a.len() && i1 < b.len() {
                // Element only in A
                if a[i0] < b[i1] {
                    i0 += 1;
                }
                // Element only in B
                else if b[i1] < a[i0] {
                    i1 += 1;
                }
                // Element shared
                else {
                    result.push(a[i0]);
                    i0 += 1;
                    i1 += 1;
                }
            }

            result
        },
        OpType::AndNot => {
            let mut result = Vec::with_capacity(a.len());

            let mut i0 = 0;
            let mut i1 = 0;
            while i0 < a.len() && i1 < b.len() {
                // Element only in A
                if a[i0] < b[i1] {
                    result.push(a[i0]);
                    i0 += 1;
                }
                // Element only in B
                else if b[i1] < a[i0] {
                    i1 += 1;
                }
                // Element shared
                else {
                    i0 += 1;
                    i1 += 1;
                }
            }

            if i0 < a.len() {
                result.extend_from_slice(&a[i0..]);
            }

            result
        },
    }
}

/// Create a bitset of `bit_capacity` bits with the given values set
pub(crate) fn make_bitset(bit_capacity: usize, data: &[usize]) -> Bitset {
    let mut bitset = Bitset::new(bit_capacity).unwrap();
    for value in data {
        bitset.set(*value).unwrap();
    }

    bitset
}

/// Collect the set bits of a bitset by testing every index
pub(crate) fn values(bitset: &Bitset) -> Vec<usize> {
    (0..bitset.bit_capacity())
        .filter(|i| bitset.test(*i).unwrap())
        .collect()
}

/// Check that a bitset holds exactly `expected` and that its internal state is consistent
pub(crate) fn assert_contents(bitset: &Bitset, expected: &[usize]) {
    bitset.assert_valid();

    let found = values(bitset);
    assert_eq!(
        bitset.cardinality(),
        expected.len(),
        "Unequal cardinality. found {}, expected {}",
        bitset.cardinality(),
        expected.len()
    );
    assert_eq!(found, expected, "Sets are not equivalent");
}
