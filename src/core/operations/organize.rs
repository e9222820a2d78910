use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, info_span, warn};

use super::Materializer;
use crate::core::dataset::{parse_week, ClassCatalog, GrowthWeek, SampleId};
use crate::core::report::{FileFailure, OrganizeReport, WeedRecord};
use crate::error::Result;

/// Regroup `src_root/<weed>/<file>` into `dst_root/<weed>_<week>/<file>`
/// using the week token embedded in each filename.
///
/// An empty `weeds` selection takes every class found in the source.
pub fn organize_by_week<M: Materializer + ?Sized>(
    src_root: &Path,
    dst_root: &Path,
    weeds: &[String],
    materializer: &M,
) -> Result<OrganizeReport> {
    let catalog = ClassCatalog::open(src_root)?;

    let selected = if weeds.is_empty() {
        catalog.list_classes()?
    } else {
        weeds.to_vec()
    };

    info!(
        "Organizing {} weeds from {:?} into {:?}",
        selected.len(),
        src_root,
        dst_root
    );

    let mut report = OrganizeReport {
        source: src_root.to_path_buf(),
        destination: dst_root.to_path_buf(),
        ..OrganizeReport::default()
    };

    for weed in &selected {
        let _span = info_span!("class", name = %weed).entered();

        if !catalog.class_dir(weed).is_dir() {
            warn!("{} not found in source directory", weed);
            report.missing.push(weed.clone());
            continue;
        }

        report.weeds.push(organize_weed(&catalog, weed, dst_root, materializer));
    }

    info!(
        "Organize complete: {} classes, {} images, {} problems",
        report.total_classes(),
        report.total_images(),
        report.failure_count()
    );

    Ok(report)
}

fn organize_weed<M: Materializer + ?Sized>(
    catalog: &ClassCatalog,
    weed: &str,
    dst_root: &Path,
    materializer: &M,
) -> WeedRecord {
    let mut record = WeedRecord {
        weed: weed.to_string(),
        ..WeedRecord::default()
    };

    let mut by_week: BTreeMap<String, (GrowthWeek, Vec<SampleId>)> = BTreeMap::new();
    for sample in catalog.list_samples(weed) {
        match parse_week(sample.as_str()) {
            Ok(week) => {
                let group = by_week
                    .entry(week.token.clone())
                    .or_insert_with(|| (week, Vec::new()));
                group.1.push(sample);
            }
            Err(e) => {
                warn!("{}", e);
                record.unparsed.push(FileFailure {
                    path: catalog.sample_path(weed, &sample),
                    reason: e.to_string(),
                });
            }
        }
    }

    for (token, (week, samples)) in by_week {
        let class = week.class_name(weed);
        let class_dir = dst_root.join(&class);
        let mut copied = 0;

        for sample in &samples {
            let src = catalog.sample_path(weed, sample);
            match materializer.copy(&src, &class_dir.join(sample.as_str())) {
                Ok(_) => copied += 1,
                Err(e) => {
                    warn!("{}", e);
                    record.failures.push(FileFailure {
                        path: src,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!("{}: {} images", class, copied);
        record.weeks.insert(token, copied);
    }

    record
}
