use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::analysis::{
    BalancePolicy, RatioTriple, StratifiedSplitter, DEFAULT_MIN_VIABLE_COUNT, DEFAULT_SEED,
};
use crate::core::augment::AugmentationConfig;
use crate::core::operations::{AugmentOptions, UnsupportedPolicy};
use crate::error::{DatasetError, Result};

/// Weed species organized by default
pub const DEFAULT_WEEDS: [&str; 5] = [
    "asian-flatsedge",
    "asiatic-dayflower",
    "indian-goosegrass",
    "korean-dock",
    "nipponicus-sedge",
];

/// Application configuration. Every field falls back to its default when
/// missing from the file, so partial configs are valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub organize: OrganizeSettings,
    pub split: SplitSettings,
    pub augment: AugmentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeSettings {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub weeds: Vec<String>,
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("./data_filtered_by_weeks"),
            weeds: DEFAULT_WEEDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSettings {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub train_ratio: f64,
    pub val_ratio: f64,
    pub test_ratio: f64,
    pub seed: u64,
    pub min_viable_count: usize,
}

impl Default for SplitSettings {
    fn default() -> Self {
        let ratios = RatioTriple::default();
        Self {
            source_dir: PathBuf::from("./data_filtered_by_weeks"),
            output_dir: PathBuf::from("./data_final_split"),
            train_ratio: ratios.train(),
            val_ratio: ratios.val(),
            test_ratio: ratios.test(),
            seed: DEFAULT_SEED,
            min_viable_count: DEFAULT_MIN_VIABLE_COUNT,
        }
    }
}

impl SplitSettings {
    /// Validated splitter for these settings
    pub fn splitter(&self) -> Result<StratifiedSplitter> {
        let ratios = RatioTriple::new(self.train_ratio, self.val_ratio, self.test_ratio)?;
        Ok(StratifiedSplitter::new(ratios, self.seed).with_min_viable_count(self.min_viable_count))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentSettings {
    pub train_dir: PathBuf,
    pub min_threshold: usize,
    pub target_count: usize,
    pub seed: u64,
    pub on_unsupported: UnsupportedPolicy,
    pub transforms: AugmentationConfig,
}

impl Default for AugmentSettings {
    fn default() -> Self {
        let policy = BalancePolicy::default();
        Self {
            train_dir: PathBuf::from("./data_final_split/train"),
            min_threshold: policy.min_threshold,
            target_count: policy.target_count,
            seed: DEFAULT_SEED,
            on_unsupported: UnsupportedPolicy::default(),
            transforms: AugmentationConfig::default(),
        }
    }
}

impl AugmentSettings {
    pub fn options(&self) -> AugmentOptions {
        AugmentOptions {
            policy: BalancePolicy {
                min_threshold: self.min_threshold,
                target_count: self.target_count,
            },
            seed: self.seed,
            on_unsupported: self.on_unsupported,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level for this crate when `RUST_LOG` is unset
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file_logging: true,
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    User(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::User(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Configuration plus notes gathered while loading it. Loading happens
/// before logging is installed, so warnings are handed back to the caller.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: ConfigSource,
    pub warnings: Vec<String>,
}

/// `config.json` in the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "growth-split").map(|dirs| dirs.config_dir().join("config.json"))
}

impl AppConfig {
    /// Load from `explicit` if given; it must exist and parse. Otherwise try
    /// the user config file and fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            return Ok(LoadedConfig {
                config,
                source: ConfigSource::Explicit(path.to_path_buf()),
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        match default_config_path() {
            Some(path) if path.is_file() => match Self::from_file(&path) {
                Ok(config) => {
                    return Ok(LoadedConfig {
                        config,
                        source: ConfigSource::User(path),
                        warnings,
                    })
                }
                Err(e) => warnings.push(format!("{}. Using defaults.", e)),
            },
            Some(_) => {}
            None => warnings.push("Could not determine config directory. Using defaults.".into()),
        }

        Ok(LoadedConfig {
            config: Self::default(),
            source: ConfigSource::Defaults,
            warnings,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|source| DatasetError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| DatasetError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.split.train_ratio, 0.6);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.split.min_viable_count, 5);
        assert_eq!(config.augment.min_threshold, 100);
        assert_eq!(config.augment.target_count, 250);
        assert_eq!(config.augment.on_unsupported, UnsupportedPolicy::Skip);
        assert_eq!(config.organize.weeds.len(), 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/config.json");

        let mut config = AppConfig::default();
        config.split.seed = 7;
        config.augment.on_unsupported = UnsupportedPolicy::CopySource;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.source, ConfigSource::Explicit(path));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "split": { "seed": 1 }, "augment": { "on_unsupported": "copy_source" } }"#)
            .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.split.seed, 1);
        assert_eq!(config.split.val_ratio, 0.2);
        assert_eq!(config.augment.on_unsupported, UnsupportedPolicy::CopySource);
        assert_eq!(config.augment.target_count, 250);
    }

    #[test]
    fn test_explicit_config_must_exist_and_parse() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.json");
        assert!(matches!(
            AppConfig::load(Some(missing.as_path())),
            Err(DatasetError::NotFound { .. })
        ));

        let corrupt = tmp.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        let err = AppConfig::load(Some(corrupt.as_path())).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_invalid_ratios_fail_before_splitting() {
        let settings = SplitSettings {
            train_ratio: 0.5,
            val_ratio: 0.3,
            test_ratio: 0.3,
            ..SplitSettings::default()
        };
        assert!(settings.splitter().unwrap_err().is_config());
    }
}
