mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};

use cli::{Cli, Command};
use growth_split::config::AppConfig;
use growth_split::logging::setup_logging;

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Command::InitConfig(args) => return cli::commands::init_config(args),
        command => command,
    };

    let loaded = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let mut config = loaded.config;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.no_log_file {
        config.logging.file_logging = false;
    }

    setup_logging(&config.logging).context("Failed to set up logging")?;

    for warning in &loaded.warnings {
        warn!("{}", warning);
    }
    info!("Using configuration from {}", loaded.source);

    match command {
        Command::Organize(args) => cli::commands::organize(config, args),
        Command::Split(args) => cli::commands::split(config, args),
        Command::Augment(args) => cli::commands::augment(config, args),
        Command::Summary(args) => cli::commands::summary(config, args),
        Command::InitConfig(args) => cli::commands::init_config(args),
    }
}
