//! End-of-run reports.
//!
//! Runners produce one immutable record per class and push it into the
//! report they own. Reports render as console tables (`Display`) and
//! export as JSON (`Serialize`).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::analysis::{RatioTriple, SplitCounts};
use crate::core::dataset::{DatasetSplit, SampleId};
use crate::error::{DatasetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    /// Every file was processed
    Complete,
    /// Some files failed, the rest were processed
    Partial,
    /// Nothing to do for this class
    Sufficient,
    /// Class was excluded
    Skipped,
}

/// A single file that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Write any report as pretty JSON
pub fn write_json_report<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    fs::write(path, json).map_err(|e| DatasetError::io(path, e))?;
    info!("Report written to {:?}", path);
    Ok(())
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

// =============================================================================
// SPLIT
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ClassSplitRecord {
    pub class: String,
    pub total: usize,
    /// Files successfully copied per split
    pub copied: SplitCounts,
    /// Files assigned per split
    pub assigned: SplitCounts,
    pub failures: Vec<FileFailure>,
}

impl ClassSplitRecord {
    pub fn status(&self) -> ClassStatus {
        if self.failures.is_empty() {
            ClassStatus::Complete
        } else {
            ClassStatus::Partial
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedClass {
    pub class: String,
    pub sample_count: usize,
    pub required: usize,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClassSplitOutcome {
    Split(ClassSplitRecord),
    Skipped(SkippedClass),
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub ratios: RatioTriple,
    pub seed: u64,
    pub classes: Vec<ClassSplitRecord>,
    pub skipped: Vec<SkippedClass>,
}

impl SplitReport {
    pub fn new(source: &Path, destination: &Path, ratios: RatioTriple, seed: u64) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            ratios,
            seed,
            classes: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ClassSplitOutcome) {
        match outcome {
            ClassSplitOutcome::Split(record) => self.classes.push(record),
            ClassSplitOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    /// Copied files per split across all classes
    pub fn totals(&self) -> SplitCounts {
        let mut totals = SplitCounts::default();
        for record in &self.classes {
            for split in DatasetSplit::ALL {
                *totals.get_mut(split) += record.copied.get(split);
            }
        }
        totals
    }

    pub fn completed_classes(&self) -> impl Iterator<Item = &ClassSplitRecord> {
        self.classes
            .iter()
            .filter(|r| r.status() == ClassStatus::Complete)
    }

    pub fn partial_classes(&self) -> impl Iterator<Item = &ClassSplitRecord> {
        self.classes
            .iter()
            .filter(|r| r.status() == ClassStatus::Partial)
    }

    pub fn failure_count(&self) -> usize {
        self.classes.iter().map(|r| r.failures.len()).sum()
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "SPLIT STATISTICS ({}, seed {})", self.ratios, self.seed)?;
        writeln!(f, "{}", "=".repeat(60))?;

        for record in &self.classes {
            let marker = match record.status() {
                ClassStatus::Partial => format!(" [PARTIAL: {} failed]", record.failures.len()),
                _ => String::new(),
            };
            writeln!(f, "{}:{}", record.class, marker)?;
            writeln!(
                f,
                "  Total: {} | Train: {} | Val: {} | Test: {}",
                record.total, record.copied.train, record.copied.val, record.copied.test
            )?;
        }

        if !self.skipped.is_empty() {
            writeln!(f, "{}", "-".repeat(60))?;
            writeln!(f, "SKIPPED (fewer than required samples):")?;
            for skipped in &self.skipped {
                writeln!(
                    f,
                    "  {}: {} images (need {})",
                    skipped.class, skipped.sample_count, skipped.required
                )?;
            }
        }

        let totals = self.totals();
        let all = totals.total();
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(
            f,
            "OVERALL: Train: {} | Val: {} | Test: {}",
            totals.train, totals.val, totals.test
        )?;
        writeln!(
            f,
            "Ratios: Train: {:.2}% | Val: {:.2}% | Test: {:.2}%",
            percent(totals.train, all),
            percent(totals.val, all),
            percent(totals.test, all)
        )?;
        write!(
            f,
            "Classes: {} complete, {} partial, {} skipped | File failures: {}",
            self.completed_classes().count(),
            self.partial_classes().count(),
            self.skipped.len(),
            self.failure_count()
        )
    }
}

// =============================================================================
// AUGMENT
// =============================================================================

/// A synthetic sample that could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub source: SampleId,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassAugmentRecord {
    pub class: String,
    pub before: usize,
    /// Synthetic samples the class is short of
    pub needed: usize,
    /// Tasks actually planned (0 when the class has no source images)
    pub planned: usize,
    /// Augmented files written
    pub written: usize,
    /// Source copies written because the transform was unavailable
    pub fallback_copies: usize,
    pub failures: Vec<TaskFailure>,
    pub after: usize,
}

impl ClassAugmentRecord {
    pub fn added(&self) -> usize {
        self.written + self.fallback_copies
    }

    pub fn status(&self) -> ClassStatus {
        if self.needed == 0 {
            ClassStatus::Sufficient
        } else if self.planned == 0 {
            ClassStatus::Skipped
        } else if self.failures.is_empty() {
            ClassStatus::Complete
        } else {
            ClassStatus::Partial
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AugmentReport {
    pub train_dir: PathBuf,
    pub min_threshold: usize,
    pub target_count: usize,
    pub seed: u64,
    pub classes: Vec<ClassAugmentRecord>,
}

impl AugmentReport {
    pub fn record(&mut self, record: ClassAugmentRecord) {
        self.classes.push(record);
    }

    pub fn augmented_classes(&self) -> impl Iterator<Item = &ClassAugmentRecord> {
        self.classes
            .iter()
            .filter(|r| r.status() != ClassStatus::Sufficient)
    }

    pub fn total_added(&self) -> usize {
        self.classes.iter().map(|r| r.added()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.classes.iter().map(|r| r.failures.len()).sum()
    }
}

impl fmt::Display for AugmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AUGMENTATION SUMMARY")?;
        writeln!(f, "{}", "=".repeat(50))?;
        for record in self.augmented_classes() {
            writeln!(f, "{}:", record.class)?;
            if record.status() == ClassStatus::Skipped {
                writeln!(f, "   No source images, {} needed", record.needed)?;
                continue;
            }
            writeln!(f, "   Before: {}", record.before)?;
            writeln!(f, "   Added:  {}", record.added())?;
            if record.fallback_copies > 0 {
                writeln!(f, "   (unchanged copies: {})", record.fallback_copies)?;
            }
            if !record.failures.is_empty() {
                writeln!(f, "   Failed: {}", record.failures.len())?;
            }
            writeln!(f, "   After:  {}", record.after)?;
        }
        writeln!(f, "{}", "=".repeat(50))?;
        write!(
            f,
            "Classes augmented: {} of {} | Added: {} | Failures: {}",
            self.augmented_classes().count(),
            self.classes.len(),
            self.total_added(),
            self.failure_count()
        )
    }
}

// =============================================================================
// ORGANIZE
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct WeedRecord {
    pub weed: String,
    /// Images copied per week token
    pub weeks: BTreeMap<String, usize>,
    /// Files whose week could not be parsed
    pub unparsed: Vec<FileFailure>,
    pub failures: Vec<FileFailure>,
}

impl WeedRecord {
    pub fn total(&self) -> usize {
        self.weeks.values().sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub weeds: Vec<WeedRecord>,
    /// Selected weeds not present in the source
    pub missing: Vec<String>,
}

impl OrganizeReport {
    pub fn total_classes(&self) -> usize {
        self.weeds.iter().map(|w| w.weeks.len()).sum()
    }

    pub fn total_images(&self) -> usize {
        self.weeds.iter().map(|w| w.total()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.weeds
            .iter()
            .map(|w| w.failures.len() + w.unparsed.len())
            .sum()
    }
}

impl fmt::Display for OrganizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "DATASET SUMMARY")?;
        writeln!(f, "{}", "=".repeat(50))?;

        for weed in &self.weeds {
            writeln!(f)?;
            writeln!(f, "{}:", weed.weed.to_uppercase())?;
            for (week, count) in &weed.weeks {
                writeln!(f, "  {}_{}: {} images", weed.weed, week, count)?;
            }
            if !weed.unparsed.is_empty() {
                writeln!(f, "  Unparsed filenames: {}", weed.unparsed.len())?;
            }
            if !weed.failures.is_empty() {
                writeln!(f, "  Copy failures: {}", weed.failures.len())?;
            }
            writeln!(f, "  Total for {}: {} images", weed.weed, weed.total())?;
        }

        for missing in &self.missing {
            writeln!(f, "Warning: {} not found in source directory", missing)?;
        }

        let classes = self.total_classes();
        let images = self.total_images();
        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "OVERALL SUMMARY:")?;
        writeln!(f, "Total classes (weed_week combinations): {}", classes)?;
        writeln!(f, "Total images: {}", images)?;
        if classes > 0 {
            writeln!(
                f,
                "Average images per class: {:.1}",
                images as f64 / classes as f64
            )?;
        }
        write!(f, "{}", "=".repeat(50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record(class: &str, train: usize, failures: usize) -> ClassSplitRecord {
        let counts = SplitCounts {
            train,
            val: 2,
            test: 2,
        };
        ClassSplitRecord {
            class: class.to_string(),
            total: train + 4,
            copied: counts,
            assigned: counts,
            failures: (0..failures)
                .map(|i| FileFailure {
                    path: PathBuf::from(format!("{}/{}.jpg", class, i)),
                    reason: "disk full".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_split_report_distinguishes_partial_classes() {
        let mut report = SplitReport::new(
            Path::new("src"),
            Path::new("dst"),
            RatioTriple::default(),
            42,
        );
        report.record(ClassSplitOutcome::Split(create_test_record("a_w0", 6, 0)));
        report.record(ClassSplitOutcome::Split(create_test_record("b_w1", 6, 2)));
        report.record(ClassSplitOutcome::Skipped(SkippedClass {
            class: "c_w2".to_string(),
            sample_count: 4,
            required: 5,
        }));

        assert_eq!(report.completed_classes().count(), 1);
        assert_eq!(report.partial_classes().count(), 1);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.totals().total(), 20);

        let rendered = report.to_string();
        assert!(rendered.contains("b_w1: [PARTIAL: 2 failed]"));
        assert!(rendered.contains("c_w2: 4 images (need 5)"));
    }

    #[test]
    fn test_augment_record_status() {
        let mut record = ClassAugmentRecord {
            class: "a".to_string(),
            before: 150,
            needed: 0,
            planned: 0,
            written: 0,
            fallback_copies: 0,
            failures: vec![],
            after: 150,
        };
        assert_eq!(record.status(), ClassStatus::Sufficient);

        record.needed = 3;
        record.planned = 3;
        record.written = 2;
        record.failures.push(TaskFailure {
            source: SampleId::new("a.jpg"),
            index: 1,
            reason: "unreadable".to_string(),
        });
        assert_eq!(record.status(), ClassStatus::Partial);
        assert_eq!(record.added(), 2);

        record.planned = 0;
        assert_eq!(record.status(), ClassStatus::Skipped);
    }

    #[test]
    fn test_write_json_report() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("reports/organize.json");
        let report = OrganizeReport::default();

        write_json_report(&report, &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["weeds"].as_array().unwrap().is_empty());
    }
}
