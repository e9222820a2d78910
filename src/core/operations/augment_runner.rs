use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, info_span, warn};

use super::Materializer;
use crate::core::analysis::{plan_augmentation, AugmentationTask, BalancePolicy, DEFAULT_SEED};
use crate::core::augment::{augment_encoded, AugmentError, Augmentation};
use crate::core::dataset::{ClassCatalog, SampleId};
use crate::core::report::{AugmentReport, ClassAugmentRecord, TaskFailure};
use crate::error::Result;

/// What to do when the augmentation cannot handle a source's format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedPolicy {
    /// Record a task failure
    #[default]
    Skip,
    /// Write the untouched source bytes under the synthetic name
    CopySource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentOptions {
    pub policy: BalancePolicy,
    pub seed: u64,
    pub on_unsupported: UnsupportedPolicy,
}

impl Default for AugmentOptions {
    fn default() -> Self {
        Self {
            policy: BalancePolicy::default(),
            seed: DEFAULT_SEED,
            on_unsupported: UnsupportedPolicy::default(),
        }
    }
}

enum TaskOutcome {
    Written,
    FallbackCopy,
}

/// Top up every under-represented class in `train_dir` with synthetic
/// samples written next to their sources.
pub fn augment_train_split<A, M>(
    train_dir: &Path,
    options: &AugmentOptions,
    augmentation: &A,
    materializer: &M,
) -> Result<AugmentReport>
where
    A: Augmentation + ?Sized,
    M: Materializer + ?Sized,
{
    let catalog = ClassCatalog::open(train_dir)?;
    let classes = catalog.list_classes()?;

    info!(
        "Balancing {} classes in {:?} (threshold {}, target {}, augmentation '{}')",
        classes.len(),
        train_dir,
        options.policy.min_threshold,
        options.policy.target_count,
        augmentation.name()
    );

    let mut report = AugmentReport {
        train_dir: train_dir.to_path_buf(),
        min_threshold: options.policy.min_threshold,
        target_count: options.policy.target_count,
        seed: options.seed,
        classes: Vec::with_capacity(classes.len()),
    };

    for class in &classes {
        let _span = info_span!("class", name = %class).entered();
        report.record(augment_class(&catalog, class, options, augmentation, materializer));
    }

    info!(
        "Augmentation complete: {} classes augmented, {} images added, {} failures",
        report.augmented_classes().count(),
        report.total_added(),
        report.failure_count()
    );

    Ok(report)
}

fn augment_class<A, M>(
    catalog: &ClassCatalog,
    class: &str,
    options: &AugmentOptions,
    augmentation: &A,
    materializer: &M,
) -> ClassAugmentRecord
where
    A: Augmentation + ?Sized,
    M: Materializer + ?Sized,
{
    let samples: Vec<SampleId> = catalog.list_samples(class).into_iter().collect();
    let before = samples.len();
    let needed = options.policy.deficit(before);

    let mut record = ClassAugmentRecord {
        class: class.to_string(),
        before,
        needed,
        planned: 0,
        written: 0,
        fallback_copies: 0,
        failures: Vec::new(),
        after: before,
    };

    if needed == 0 {
        debug!("{} has {} images, no augmentation needed", class, before);
        return record;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let tasks = plan_augmentation(&samples, &options.policy, &mut rng);
    record.planned = tasks.len();

    if tasks.is_empty() {
        warn!("{} has no images to augment from, {} needed", class, needed);
        return record;
    }

    info!("{}: {} images, generating {}", class, before, tasks.len());

    for task in &tasks {
        let outcome = run_task(
            catalog,
            class,
            task,
            options.on_unsupported,
            augmentation,
            materializer,
            &mut rng,
        );
        match outcome {
            Ok(TaskOutcome::Written) => record.written += 1,
            Ok(TaskOutcome::FallbackCopy) => record.fallback_copies += 1,
            Err(e) => {
                warn!("Failed to augment {} (#{}): {}", task.source, task.index, e);
                record.failures.push(TaskFailure {
                    source: task.source.clone(),
                    index: task.index,
                    reason: e.to_string(),
                });
            }
        }
    }

    record.after = catalog.list_samples(class).len();

    info!(
        "{}: {} -> {} ({} written, {} copied, {} failed)",
        class,
        before,
        record.after,
        record.written,
        record.fallback_copies,
        record.failures.len()
    );

    record
}

fn run_task<A, M>(
    catalog: &ClassCatalog,
    class: &str,
    task: &AugmentationTask,
    on_unsupported: UnsupportedPolicy,
    augmentation: &A,
    materializer: &M,
    rng: &mut ChaCha8Rng,
) -> std::result::Result<TaskOutcome, AugmentError>
where
    A: Augmentation + ?Sized,
    M: Materializer + ?Sized,
{
    let src = catalog.sample_path(class, &task.source);
    let dst = catalog.class_dir(class).join(task.output_name());

    let bytes = fs::read(&src).map_err(|source| AugmentError::Read {
        path: src.clone(),
        source,
    })?;

    match augment_encoded(augmentation, &src, &bytes, rng) {
        Ok(encoded) => {
            materializer.write(&encoded, &dst)?;
            Ok(TaskOutcome::Written)
        }
        Err(e) if e.is_unsupported() && on_unsupported == UnsupportedPolicy::CopySource => {
            debug!("{}, copying source unchanged to {:?}", e, dst);
            materializer.write(&bytes, &dst)?;
            Ok(TaskOutcome::FallbackCopy)
        }
        Err(e) => Err(e),
    }
}
