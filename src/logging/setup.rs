use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::formatter::BracketedFormatter;
use crate::config::LoggingSettings;
use crate::error::{DatasetError, Result};

/// `RUST_LOG` wins, otherwise `level` for this crate with quieter dependencies
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = format!("warn,growth_split={}", level);
    EnvFilter::try_new(&directives)
        .map_err(|e| DatasetError::config(format!("invalid log level '{}': {}", level, e)))
}

/// Install the global subscriber. Returns the log file path when file
/// logging is enabled.
pub fn setup_logging(settings: &LoggingSettings) -> Result<Option<PathBuf>> {
    let filter = build_filter(&settings.level)?;

    let stdout_layer = fmt::layer()
        .event_format(BracketedFormatter)
        .with_writer(std::io::stdout);

    let (file_layer, log_path) = if settings.file_logging {
        fs::create_dir_all(&settings.log_dir)
            .map_err(|e| DatasetError::io(&settings.log_dir, e))?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_path = settings
            .log_dir
            .join(format!("growth_split_{}.log", timestamp));

        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_path)
            .map_err(|e| DatasetError::io(&log_path, e))?;

        let layer = fmt::layer()
            .event_format(BracketedFormatter)
            .with_writer(Mutex::new(file))
            .with_ansi(false);
        (Some(layer), Some(log_path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| DatasetError::config(format!("logging already initialized: {}", e)))?;

    info!("Starting growth-split {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &log_path {
        info!("Log file created at: {:?}", path);
    }

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(build_filter(level).is_ok(), "level {}", level);
        }
    }
}
