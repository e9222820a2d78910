use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::core::dataset::{ClassCatalog, DatasetSplit};
use crate::error::{DatasetError, Result};

/// Image counts of one class across the three splits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl SplitCounts {
    pub fn get(&self, split: DatasetSplit) -> usize {
        match split {
            DatasetSplit::Train => self.train,
            DatasetSplit::Val => self.val,
            DatasetSplit::Test => self.test,
        }
    }

    pub fn get_mut(&mut self, split: DatasetSplit) -> &mut usize {
        match split {
            DatasetSplit::Train => &mut self.train,
            DatasetSplit::Val => &mut self.val,
            DatasetSplit::Test => &mut self.test,
        }
    }

    pub fn total(&self) -> usize {
        self.train + self.val + self.test
    }
}

/// Per-class image counts of a split dataset
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetSummary {
    pub classes: BTreeMap<String, SplitCounts>,
}

impl DatasetSummary {
    pub fn totals(&self) -> SplitCounts {
        self.classes
            .values()
            .fold(SplitCounts::default(), |acc, c| SplitCounts {
                train: acc.train + c.train,
                val: acc.val + c.val,
                test: acc.test + c.test,
            })
    }
}

/// Count eligible images per class under `root/{train,val,test}`.
///
/// A missing split directory counts as empty.
pub fn summarize_splits(root: &Path) -> Result<DatasetSummary> {
    if !root.is_dir() {
        return Err(DatasetError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let mut summary = DatasetSummary::default();

    for split in DatasetSplit::ALL {
        let split_root = root.join(split.as_str());
        let catalog = match ClassCatalog::open(&split_root) {
            Ok(catalog) => catalog,
            Err(_) => {
                warn!("Split directory missing: {:?}", split_root);
                continue;
            }
        };

        for class in catalog.list_classes()? {
            let count = catalog.list_samples(&class).len();
            *summary.classes.entry(class).or_default().get_mut(split) += count;
        }
    }

    info!(
        "Summarized {} classes under {:?}",
        summary.classes.len(),
        root
    );
    Ok(summary)
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOTAL CLASSES: {}", self.classes.len())?;
        writeln!(f)?;
        writeln!(f, "SUMMARY PER CLASS")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(
            f,
            "{:30} {:>6} {:>6} {:>6} {:>6}",
            "Class Name", "Train", "Val", "Test", "Total"
        )?;
        writeln!(f, "{}", "-".repeat(60))?;
        for (class, counts) in &self.classes {
            writeln!(
                f,
                "{:30} {:6} {:6} {:6} {:6}",
                class,
                counts.train,
                counts.val,
                counts.test,
                counts.total()
            )?;
        }
        let totals = self.totals();
        writeln!(f, "{}", "-".repeat(60))?;
        writeln!(
            f,
            "{:30} {:6} {:6} {:6} {:6}",
            "TOTAL",
            totals.train,
            totals.val,
            totals.test,
            totals.total()
        )?;
        write!(f, "{}", "=".repeat(60))
    }
}
