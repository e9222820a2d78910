//! CLI command implementations

use anyhow::{bail, Context, Result};

use growth_split::config::{default_config_path, AppConfig};
use growth_split::core::analysis::summarize_splits;
use growth_split::core::augment::AugmentPipeline;
use growth_split::core::operations::{
    augment_train_split, organize_by_week, split_dataset, FsMaterializer, UnsupportedPolicy,
};
use growth_split::core::report::write_json_report;

use super::{AugmentArgs, InitConfigArgs, OrganizeArgs, SplitArgs, SummaryArgs};

pub fn organize(mut config: AppConfig, args: OrganizeArgs) -> Result<()> {
    let settings = &mut config.organize;
    if let Some(src) = args.src {
        settings.source_dir = src;
    }
    if let Some(dst) = args.dst {
        settings.output_dir = dst;
    }
    if let Some(weeds) = args.weeds {
        settings.weeds = weeds;
    }

    let report = organize_by_week(
        &settings.source_dir,
        &settings.output_dir,
        &settings.weeds,
        &FsMaterializer,
    )
    .context("Organize by week failed")?;

    println!("{}", report);
    Ok(())
}

pub fn split(mut config: AppConfig, args: SplitArgs) -> Result<()> {
    let settings = &mut config.split;
    if let Some(src) = args.src {
        settings.source_dir = src;
    }
    if let Some(dst) = args.dst {
        settings.output_dir = dst;
    }
    if let Some(train) = args.train {
        settings.train_ratio = train;
    }
    if let Some(val) = args.val {
        settings.val_ratio = val;
    }
    if let Some(test) = args.test {
        settings.test_ratio = test;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(min_samples) = args.min_samples {
        settings.min_viable_count = min_samples;
    }

    // Validate ratios before touching the filesystem
    let splitter = settings.splitter()?;

    let report = split_dataset(
        &settings.source_dir,
        &settings.output_dir,
        &splitter,
        &FsMaterializer,
    )
    .context("Dataset split failed")?;

    println!("{}", report);

    if let Some(path) = args.report {
        write_json_report(&report, &path)?;
    }
    Ok(())
}

pub fn augment(mut config: AppConfig, args: AugmentArgs) -> Result<()> {
    let settings = &mut config.augment;
    if let Some(train_dir) = args.train_dir {
        settings.train_dir = train_dir;
    }
    if let Some(min_count) = args.min_count {
        settings.min_threshold = min_count;
    }
    if let Some(target) = args.target {
        settings.target_count = target;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.copy_unsupported {
        settings.on_unsupported = UnsupportedPolicy::CopySource;
    }

    let pipeline = AugmentPipeline::from_config(&settings.transforms);
    let report = augment_train_split(
        &settings.train_dir,
        &settings.options(),
        &pipeline,
        &FsMaterializer,
    )
    .context("Training split augmentation failed")?;

    println!("{}", report);

    if let Some(path) = args.report {
        write_json_report(&report, &path)?;
    }
    Ok(())
}

pub fn summary(config: AppConfig, args: SummaryArgs) -> Result<()> {
    let dataset = args.dataset.unwrap_or(config.split.output_dir);
    let summary = summarize_splits(&dataset)
        .with_context(|| format!("Failed to summarize {}", dataset.display()))?;

    println!("{}", summary);
    Ok(())
}

/// Runs before logging is installed, so it reports on stdout only
pub fn init_config(args: InitConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => default_config_path().context("Could not determine config directory")?,
    };

    if path.exists() && !args.force {
        bail!(
            "{} already exists, pass --force to replace it",
            path.display()
        );
    }

    AppConfig::default().save(&path)?;
    println!("Default configuration written to {}", path.display());
    Ok(())
}
