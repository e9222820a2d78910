//! Read-only scan of a class-per-directory image dataset.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::SampleId;
use crate::error::{DatasetError, Result};

/// Recognized image extensions (matched case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether a path has one of the recognized image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// View over `root/<class>/<sample>`
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    root: PathBuf,
}

impl ClassCatalog {
    /// Open a catalog rooted at `root`, which must be an existing directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DatasetError::NotFound { path: root });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn class_dir(&self, class: &str) -> PathBuf {
        self.root.join(class)
    }

    pub fn sample_path(&self, class: &str, sample: &SampleId) -> PathBuf {
        self.class_dir(class).join(sample.as_str())
    }

    /// Sorted names of all class directories under the root
    pub fn list_classes(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| DatasetError::io(&self.root, e))?;

        let mut classes = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => classes.push(name),
                Err(name) => warn!("Skipping class directory with non UTF-8 name: {:?}", name),
            }
        }
        classes.sort();

        debug!("Found {} classes in {:?}", classes.len(), self.root);
        Ok(classes)
    }

    /// Eligible samples of one class.
    ///
    /// Never fails: a missing or unreadable class directory yields an
    /// empty set and a warning.
    pub fn list_samples(&self, class: &str) -> BTreeSet<SampleId> {
        let class_dir = self.class_dir(class);
        let mut samples = BTreeSet::new();

        let entries = match fs::read_dir(&class_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read class directory {:?}: {}", class_dir, e);
                return samples;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_image_file(&path) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => {
                    samples.insert(SampleId::new(name));
                }
                Err(name) => warn!("Skipping sample with non UTF-8 name: {:?}", name),
            }
        }

        if samples.is_empty() {
            warn!("Class {} has no eligible images", class);
        }
        samples
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_image_file_case_insensitive() {
        assert!(is_image_file(Path::new("a/b.JPG")));
        assert!(is_image_file(Path::new("b.jpeg")));
        assert!(is_image_file(Path::new("b.Png")));
        assert!(!is_image_file(Path::new("b.txt")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[test]
    fn test_open_missing_root() {
        let result = ClassCatalog::open("/definitely/not/a/real/root");
        assert!(matches!(result, Err(DatasetError::NotFound { .. })));
    }

    #[test]
    fn test_list_classes_sorted_and_dirs_only() {
        let tmp = TempDir::new().unwrap();
        create_test_class(tmp.path(), "zeta_w1", &numbered_names("z", 1, "jpg"));
        create_test_class(tmp.path(), "alpha_w0", &numbered_names("a", 1, "jpg"));
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();

        let catalog = ClassCatalog::open(tmp.path()).unwrap();
        assert_eq!(catalog.list_classes().unwrap(), vec!["alpha_w0", "zeta_w1"]);
    }

    #[test]
    fn test_list_samples_filters_extensions() {
        let tmp = TempDir::new().unwrap();
        let names = vec![
            "a.jpg".to_string(),
            "b.PNG".to_string(),
            "c.jpeg".to_string(),
            "d.txt".to_string(),
            "e.gif".to_string(),
        ];
        create_test_class(tmp.path(), "weed_w2", &names);

        let catalog = ClassCatalog::open(tmp.path()).unwrap();
        let samples: Vec<String> = catalog
            .list_samples("weed_w2")
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(samples, vec!["a.jpg", "b.PNG", "c.jpeg"]);
    }

    #[test]
    fn test_list_samples_missing_class_is_empty() {
        let tmp = TempDir::new().unwrap();
        let catalog = ClassCatalog::open(tmp.path()).unwrap();
        assert!(catalog.list_samples("ghost").is_empty());
    }
}
