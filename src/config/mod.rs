mod app_config;

pub use app_config::{
    default_config_path, AppConfig, AugmentSettings, ConfigSource, LoadedConfig, LoggingSettings,
    OrganizeSettings, SplitSettings, DEFAULT_WEEDS,
};
