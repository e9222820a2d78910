//! Command line interface
//!
//! Subcommands mirror the preparation pipeline:
//! - `organize`: regroup raw weed folders by growth week
//! - `split`: stratified train/val/test split
//! - `augment`: balance the training split with synthetic samples
//! - `summary`: per-class counts of a split dataset
//! - `init-config`: write the default configuration

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Growth-week dataset preparation for weed image classification
#[derive(Parser)]
#[command(name = "growth-split")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level for this tool (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Only log to the console
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Regroup raw weed folders into <weed>_<week> classes
    Organize(OrganizeArgs),

    /// Split classes into train/val/test with per-class stratification
    Split(SplitArgs),

    /// Augment under-represented classes of the training split
    Augment(AugmentArgs),

    /// Show per-class image counts of a split dataset
    Summary(SummaryArgs),

    /// Write the default configuration as JSON
    InitConfig(InitConfigArgs),
}

#[derive(Args)]
pub struct OrganizeArgs {
    /// Directory with one folder per weed
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Output directory for the week classes
    #[arg(long)]
    pub dst: Option<PathBuf>,

    /// Weeds to organize (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub weeds: Option<Vec<String>>,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Directory with one folder per class
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Output directory for train/val/test
    #[arg(long)]
    pub dst: Option<PathBuf>,

    /// Training fraction
    #[arg(long)]
    pub train: Option<f64>,

    /// Validation fraction
    #[arg(long)]
    pub val: Option<f64>,

    /// Test fraction
    #[arg(long)]
    pub test: Option<f64>,

    /// Shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Classes with fewer images are excluded
    #[arg(long)]
    pub min_samples: Option<usize>,

    /// Save the report to a JSON file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct AugmentArgs {
    /// Training split directory
    #[arg(long)]
    pub train_dir: Option<PathBuf>,

    /// Classes with fewer images are augmented
    #[arg(long)]
    pub min_count: Option<usize>,

    /// Image count augmented classes are brought up to
    #[arg(long)]
    pub target: Option<usize>,

    /// Sampling and transform seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Copy the source unchanged when its format cannot be augmented
    #[arg(long)]
    pub copy_unsupported: bool,

    /// Save the report to a JSON file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Split dataset root containing train/val/test
    #[arg(long)]
    pub dataset: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Destination (defaults to the user config directory)
    pub path: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}
