//! Seeded shuffling for reproducible train/test splits
//!
//! Uses a linear congruential generator with fixed constants so the same
//! seed yields the same permutation on every platform and every run.

use crate::errors::{Result, TrainerError};
use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses the glibc constants
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 1103515245;
    const INCREMENT: u64 = 12345;
    const MODULUS: u64 = 1 << 31;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed % Self::MODULUS),
        }
    }

    /// Next value in `[0, 2^31)`
    pub fn next_u31(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 &= Self::MODULUS - 1;
        self.state.0
    }

    /// Value in `[0, max)`, taken from the high bits of the state.
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_u31() * max as u64) >> 31) as usize
    }
}

/// Fisher–Yates permutation of `0..n`.
pub fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = LcgRng::new(seed);
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.next_range(i + 1);
        order.swap(i, j);
    }
    order
}

/// Row indices of a train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Random, non-stratified split with `ceil(test_fraction * n)` test rows.
///
/// The test rows are the head of the seeded permutation, the train rows
/// its tail. Both sides must end up non-empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrainerError::InvalidSplit(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainerError::InvalidSplit(format!(
            "{n} rows cannot be split into {n_test} test rows and a non-empty train set"
        )));
    }

    let mut order = permutation(n, seed);
    let train = order.split_off(n_test);
    Ok(Split { train, test: order })
}
