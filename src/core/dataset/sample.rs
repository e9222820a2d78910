use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stable identifier of a sample: its filename inside the class directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename without its extension (`plant_01_w2.jpg` -> `plant_01_w2`)
    pub fn stem(&self) -> &str {
        Path::new(&self.0)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.0)
    }

    /// Extension including the leading dot, or an empty string
    pub fn dotted_extension(&self) -> String {
        Path::new(&self.0)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<Path> for SampleId {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}
