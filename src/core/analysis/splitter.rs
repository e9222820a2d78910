//! Stratified train/val/test splitting.
//!
//! Each class is split on its own with two seeded cuts: first the test
//! subset is taken from the whole class, then the remaining pool is cut
//! into train and val using the val ratio re-normalized to that pool.
//! Splits are reproducible for a given `(samples, ratios, seed)`.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::core::dataset::{DatasetSplit, SampleId};
use crate::error::{DatasetError, Result};

/// Allowed deviation of the ratio sum from 1.0
pub const RATIO_TOLERANCE: f64 = 1e-3;

/// Classes with fewer samples are not split
pub const DEFAULT_MIN_VIABLE_COUNT: usize = 5;

/// Default seed, shared by both cuts
pub const DEFAULT_SEED: u64 = 42;

// Keeps exact products such as 0.2 * 100 from rounding up on float noise
const ROUNDING_EPSILON: f64 = 1e-9;

/// Validated (train, val, test) fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioTriple {
    train: f64,
    val: f64,
    test: f64,
}

impl RatioTriple {
    /// Validate and build a ratio triple.
    ///
    /// Each ratio must be finite and non-negative, and the three must sum
    /// to 1.0 within [`RATIO_TOLERANCE`].
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        for (name, value) in [("train", train), ("val", val), ("test", test)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DatasetError::config(format!(
                    "{} ratio must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let total = train + val + test;
        if (total - 1.0).abs() >= RATIO_TOLERANCE {
            return Err(DatasetError::config(format!(
                "Split ratios must sum to 1.0. Got {} (train={}, val={}, test={})",
                total, train, val, test
            )));
        }

        Ok(Self { train, val, test })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    /// Val fraction of the train+val pool left after the test cut
    pub fn val_fraction_of_pool(&self) -> f64 {
        let pool = self.train + self.val;
        if pool <= 0.0 {
            0.0
        } else {
            self.val / pool
        }
    }
}

impl Default for RatioTriple {
    fn default() -> Self {
        Self {
            train: 0.60,
            val: 0.20,
            test: 0.20,
        }
    }
}

impl fmt::Display for RatioTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train={:.2} val={:.2} test={:.2}",
            self.train, self.val, self.test
        )
    }
}

/// A class too small to be split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientSamples {
    pub found: usize,
    pub required: usize,
}

impl fmt::Display for InsufficientSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "only {} samples, at least {} required",
            self.found, self.required
        )
    }
}

/// Result of splitting one class. The three subsets are disjoint and
/// together hold every input sample exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<SampleId>,
    pub val: Vec<SampleId>,
    pub test: Vec<SampleId>,
}

impl SplitAssignment {
    pub fn get(&self, split: DatasetSplit) -> &[SampleId] {
        match split {
            DatasetSplit::Train => &self.train,
            DatasetSplit::Val => &self.val,
            DatasetSplit::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every (split, sample) pair, train first
    pub fn iter(&self) -> impl Iterator<Item = (DatasetSplit, &SampleId)> {
        DatasetSplit::ALL
            .into_iter()
            .flat_map(move |split| self.get(split).iter().map(move |s| (split, s)))
    }
}

/// Number of items the test side of a cut receives: `ceil(fraction * n)`,
/// clamped to `[0, n]`.
fn test_count(n: usize, fraction: f64) -> usize {
    let raw = fraction * n as f64 - ROUNDING_EPSILON;
    (raw.ceil().max(0.0) as usize).min(n)
}

/// Shuffle `items` with a generator seeded from `seed` and cut off the
/// test side. Returns `(rest, test)`.
pub fn train_test_split<T: Clone>(items: &[T], test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let n_test = test_count(items.len(), test_fraction);

    let mut shuffled = items.to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let rest = shuffled.split_off(n_test);
    (rest, shuffled)
}

/// Per-class stratified splitter
#[derive(Debug, Clone)]
pub struct StratifiedSplitter {
    ratios: RatioTriple,
    seed: u64,
    min_viable_count: usize,
}

impl StratifiedSplitter {
    pub fn new(ratios: RatioTriple, seed: u64) -> Self {
        Self {
            ratios,
            seed,
            min_viable_count: DEFAULT_MIN_VIABLE_COUNT,
        }
    }

    pub fn with_min_viable_count(mut self, min_viable_count: usize) -> Self {
        self.min_viable_count = min_viable_count;
        self
    }

    pub fn ratios(&self) -> &RatioTriple {
        &self.ratios
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn min_viable_count(&self) -> usize {
        self.min_viable_count
    }

    /// Split one class into train/val/test.
    ///
    /// Classes below the minimum viable count are rejected without any
    /// partial split.
    pub fn split(
        &self,
        samples: &BTreeSet<SampleId>,
    ) -> std::result::Result<SplitAssignment, InsufficientSamples> {
        if samples.len() < self.min_viable_count {
            return Err(InsufficientSamples {
                found: samples.len(),
                required: self.min_viable_count,
            });
        }

        let ordered: Vec<SampleId> = samples.iter().cloned().collect();

        let (train_val, test) = train_test_split(&ordered, self.ratios.test(), self.seed);
        let (train, val) = train_test_split(&train_val, self.ratios.val_fraction_of_pool(), self.seed);

        Ok(SplitAssignment { train, val, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_samples(count: usize) -> BTreeSet<SampleId> {
        (0..count)
            .map(|i| SampleId::new(format!("weed_{:03}_w1.jpg", i)))
            .collect()
    }

    fn default_splitter() -> StratifiedSplitter {
        StratifiedSplitter::new(RatioTriple::default(), DEFAULT_SEED)
    }

    #[test]
    fn test_ratio_validation_rejects_bad_sum() {
        let result = RatioTriple::new(0.5, 0.3, 0.3);
        assert!(matches!(result, Err(DatasetError::Config(_))));
    }

    #[test]
    fn test_ratio_validation_tolerance() {
        assert!(RatioTriple::new(0.6, 0.2, 0.2005).is_ok());
        assert!(RatioTriple::new(0.6, 0.2, 0.202).is_err());
    }

    #[test]
    fn test_ratio_validation_rejects_negative() {
        assert!(RatioTriple::new(1.2, -0.2, 0.0).is_err());
        assert!(RatioTriple::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_val_fraction_renormalized() {
        let ratios = RatioTriple::new(0.6, 0.2, 0.2).unwrap();
        assert!((ratios.val_fraction_of_pool() - 0.25).abs() < 1e-12);

        let all_test = RatioTriple::new(0.0, 0.0, 1.0).unwrap();
        assert_eq!(all_test.val_fraction_of_pool(), 0.0);
    }

    #[test]
    fn test_exact_ratio_fidelity() {
        let samples = create_test_samples(100);
        let split = default_splitter().split(&samples).unwrap();

        assert_eq!(split.train.len(), 60);
        assert_eq!(split.val.len(), 20);
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn test_partition_completeness() {
        for count in [5, 7, 13, 33, 101] {
            let samples = create_test_samples(count);
            let split = default_splitter().split(&samples).unwrap();

            let train: BTreeSet<_> = split.train.iter().cloned().collect();
            let val: BTreeSet<_> = split.val.iter().cloned().collect();
            let test: BTreeSet<_> = split.test.iter().cloned().collect();

            assert!(train.is_disjoint(&val));
            assert!(train.is_disjoint(&test));
            assert!(val.is_disjoint(&test));

            let union: BTreeSet<_> = train.union(&val).chain(test.iter()).cloned().collect();
            assert_eq!(union, samples);
            assert_eq!(split.len(), count);
        }
    }

    #[test]
    fn test_sizes_within_one_of_ratio() {
        let samples = create_test_samples(37);
        let split = default_splitter().split(&samples).unwrap();

        let n = samples.len() as f64;
        assert!((split.test.len() as f64 - 0.2 * n).abs() <= 1.0);
        let pool = (split.train.len() + split.val.len()) as f64;
        assert!((split.val.len() as f64 - 0.25 * pool).abs() <= 1.0);
    }

    #[test]
    fn test_determinism() {
        let samples = create_test_samples(50);
        let first = default_splitter().split(&samples).unwrap();
        let second = default_splitter().split(&samples).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seed_changes_membership() {
        let samples = create_test_samples(50);
        let a = default_splitter().split(&samples).unwrap();
        let b = StratifiedSplitter::new(RatioTriple::default(), 7)
            .split(&samples)
            .unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn test_minimum_size_exclusion() {
        let samples = create_test_samples(4);
        let result = default_splitter().split(&samples);
        assert_eq!(
            result,
            Err(InsufficientSamples {
                found: 4,
                required: 5
            })
        );
    }

    #[test]
    fn test_smallest_viable_class() {
        let samples = create_test_samples(5);
        let split = default_splitter().split(&samples).unwrap();
        // ceil(0.2 * 5) = 1 test, ceil(0.25 * 4) = 1 val
        assert_eq!(split.test.len(), 1);
        assert_eq!(split.val.len(), 1);
        assert_eq!(split.train.len(), 3);
    }

    #[test]
    fn test_zero_test_ratio() {
        let ratios = RatioTriple::new(0.8, 0.2, 0.0).unwrap();
        let split = StratifiedSplitter::new(ratios, DEFAULT_SEED)
            .split(&create_test_samples(10))
            .unwrap();
        assert!(split.test.is_empty());
        assert_eq!(split.val.len(), 2);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_iter_tags_each_sample() {
        let split = default_splitter().split(&create_test_samples(10)).unwrap();
        let tagged: Vec<_> = split.iter().collect();
        assert_eq!(tagged.len(), 10);
        assert_eq!(tagged[0].0, DatasetSplit::Train);
        assert_eq!(tagged.last().unwrap().0, DatasetSplit::Test);
    }
}
