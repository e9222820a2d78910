//! Augmentation planning for under-represented classes.
//!
//! A class below the balancing threshold is topped up to the target
//! count with synthetic samples. Each synthetic sample is derived from a
//! source drawn uniformly with replacement from the class.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::dataset::SampleId;

/// Marker inserted between the source stem and the synthetic index
pub const AUGMENT_MARKER: &str = "_aug";

/// Threshold and target for balancing one class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePolicy {
    /// Classes with at least this many samples are left untouched
    pub min_threshold: usize,
    /// Sample count an under-represented class is topped up to
    pub target_count: usize,
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            min_threshold: 100,
            target_count: 250,
        }
    }
}

impl BalancePolicy {
    /// Number of synthetic samples needed for a class of `current` samples
    pub fn deficit(&self, current: usize) -> usize {
        if current >= self.min_threshold {
            return 0;
        }
        self.target_count.saturating_sub(current)
    }
}

/// One synthetic sample to derive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AugmentationTask {
    pub source: SampleId,
    pub index: usize,
}

impl AugmentationTask {
    /// Output filename, `<source_stem>_aug<index><source_ext>`
    pub fn output_name(&self) -> String {
        synthetic_name(&self.source, self.index)
    }
}

pub fn synthetic_name(source: &SampleId, index: usize) -> String {
    format!(
        "{}{}{}{}",
        source.stem(),
        AUGMENT_MARKER,
        index,
        source.dotted_extension()
    )
}

/// Plan the synthetic samples for one class.
///
/// Returns exactly `policy.deficit(samples.len())` tasks with indices
/// `0..n`, or nothing when the class is empty since there is no source
/// to draw from.
pub fn plan_augmentation<R: Rng + ?Sized>(
    samples: &[SampleId],
    policy: &BalancePolicy,
    rng: &mut R,
) -> Vec<AugmentationTask> {
    let needed = policy.deficit(samples.len());
    if needed == 0 || samples.is_empty() {
        return Vec::new();
    }

    (0..needed)
        .map(|index| AugmentationTask {
            source: samples[rng.gen_range(0..samples.len())].clone(),
            index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn create_test_samples(count: usize) -> Vec<SampleId> {
        (0..count)
            .map(|i| SampleId::new(format!("dayflower_{:02}_w3.png", i)))
            .collect()
    }

    fn policy(min_threshold: usize, target_count: usize) -> BalancePolicy {
        BalancePolicy {
            min_threshold,
            target_count,
        }
    }

    #[test]
    fn test_sufficient_class_is_untouched() {
        let samples = create_test_samples(150);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for target in [0, 100, 250, 10_000] {
            let plan = plan_augmentation(&samples, &policy(100, target), &mut rng);
            assert!(plan.is_empty());
        }
    }

    #[test]
    fn test_deficit_math() {
        let samples = create_test_samples(30);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let plan = plan_augmentation(&samples, &policy(100, 250), &mut rng);

        assert_eq!(plan.len(), 220);

        let indices: Vec<usize> = plan.iter().map(|t| t.index).collect();
        assert_eq!(indices, (0..220).collect::<Vec<_>>());

        let originals: HashSet<&SampleId> = samples.iter().collect();
        assert!(plan.iter().all(|t| originals.contains(&t.source)));
    }

    #[test]
    fn test_sampling_with_replacement() {
        let samples = create_test_samples(3);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let plan = plan_augmentation(&samples, &policy(100, 50), &mut rng);

        assert_eq!(plan.len(), 47);
        let distinct: HashSet<&SampleId> = plan.iter().map(|t| &t.source).collect();
        assert!(distinct.len() <= 3);
    }

    #[test]
    fn test_deficit_floored_at_zero() {
        // Below threshold but already above target
        assert_eq!(policy(100, 40).deficit(60), 0);
        assert_eq!(policy(100, 250).deficit(99), 151);
        assert_eq!(policy(100, 250).deficit(100), 0);
    }

    #[test]
    fn test_empty_class_yields_empty_plan() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(plan_augmentation(&[], &policy(100, 250), &mut rng).is_empty());
    }

    #[test]
    fn test_plan_is_reproducible() {
        let samples = create_test_samples(10);
        let a = plan_augmentation(&samples, &policy(100, 30), &mut ChaCha8Rng::seed_from_u64(9));
        let b = plan_augmentation(&samples, &policy(100, 30), &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_synthetic_name() {
        let task = AugmentationTask {
            source: SampleId::new("dock_01_w2.JPG"),
            index: 17,
        };
        assert_eq!(task.output_name(), "dock_01_w2_aug17.JPG");
    }

    #[test]
    fn test_synthetic_names_unique_within_plan() {
        let samples = create_test_samples(2);
        let plan = plan_augmentation(&samples, &policy(100, 40), &mut ChaCha8Rng::seed_from_u64(3));
        let names: HashSet<String> = plan.iter().map(|t| t.output_name()).collect();
        assert_eq!(names.len(), plan.len());
        assert!(names.iter().all(|n| !samples.iter().any(|s| s.as_str() == n)));
    }
}
