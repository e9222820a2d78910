use std::fs;
use std::path::Path;
use tracing::{info, info_span, warn};

use super::Materializer;
use crate::core::analysis::{SplitCounts, StratifiedSplitter};
use crate::core::dataset::{ClassCatalog, DatasetSplit};
use crate::core::report::{
    ClassSplitOutcome, ClassSplitRecord, FileFailure, SkippedClass, SplitReport,
};
use crate::error::{DatasetError, Result};

/// Split every class under `src_root` into `dst_root/{train,val,test}/<class>`.
///
/// Fails only when the source root is missing or the split directories
/// cannot be created. Per-file copy failures are recorded in the report.
pub fn split_dataset<M: Materializer + ?Sized>(
    src_root: &Path,
    dst_root: &Path,
    splitter: &StratifiedSplitter,
    materializer: &M,
) -> Result<SplitReport> {
    let catalog = ClassCatalog::open(src_root)?;

    for split in DatasetSplit::ALL {
        let dir = dst_root.join(split.as_str());
        fs::create_dir_all(&dir).map_err(|e| DatasetError::io(&dir, e))?;
    }

    let mut report = SplitReport::new(src_root, dst_root, *splitter.ratios(), splitter.seed());
    let classes = catalog.list_classes()?;

    info!(
        "Splitting {} classes from {:?} with stratification ({})",
        classes.len(),
        src_root,
        splitter.ratios()
    );

    for class in &classes {
        let _span = info_span!("class", name = %class).entered();
        report.record(split_class(&catalog, class, dst_root, splitter, materializer));
    }

    let totals = report.totals();
    info!(
        "Split complete: train={} val={} test={}, {} skipped, {} file failures",
        totals.train,
        totals.val,
        totals.test,
        report.skipped.len(),
        report.failure_count()
    );

    Ok(report)
}

fn split_class<M: Materializer + ?Sized>(
    catalog: &ClassCatalog,
    class: &str,
    dst_root: &Path,
    splitter: &StratifiedSplitter,
    materializer: &M,
) -> ClassSplitOutcome {
    let samples = catalog.list_samples(class);

    let assignment = match splitter.split(&samples) {
        Ok(assignment) => assignment,
        Err(insufficient) => {
            warn!("{} has {}, skipping", class, insufficient);
            return ClassSplitOutcome::Skipped(SkippedClass {
                class: class.to_string(),
                sample_count: insufficient.found,
                required: insufficient.required,
            });
        }
    };

    let mut failures = Vec::new();

    // Every split gets the class directory, even when its subset is empty
    for split in DatasetSplit::ALL {
        let dir = dst_root.join(split.as_str()).join(class);
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create {:?}: {}", dir, e);
            failures.push(FileFailure {
                path: dir,
                reason: e.to_string(),
            });
        }
    }

    let mut copied = SplitCounts::default();
    for (split, sample) in assignment.iter() {
        let src = catalog.sample_path(class, sample);
        let dst = dst_root.join(split.as_str()).join(class).join(sample.as_str());

        match materializer.copy(&src, &dst) {
            Ok(_) => *copied.get_mut(split) += 1,
            Err(e) => {
                warn!("Copy failed for {}: {}", sample, e);
                failures.push(FileFailure {
                    path: src,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "{}: total={} train={} val={} test={}",
        class,
        samples.len(),
        copied.train,
        copied.val,
        copied.test
    );

    ClassSplitOutcome::Split(ClassSplitRecord {
        class: class.to_string(),
        total: samples.len(),
        copied,
        assigned: SplitCounts {
            train: assignment.train.len(),
            val: assignment.val.len(),
            test: assignment.test.len(),
        },
        failures,
    })
}
