//! End-to-end dataset assembly.
//!
//! Enumerate and shuffle once, split, then for each image in turn: decode,
//! propose regions, export crops, encode annotations and route the files.
//! The manifest is written last. Processing is strictly sequential and the
//! single [`LabelAllocator`] is threaded through by `&mut`, so label IDs
//! follow processing order: train images first, then val.
//!
//! Nothing is transactional. An error stops the run and leaves whatever was
//! written so far.

mod report;

pub use report::{BuildNote, BuildNoteCode, BuildReport, ImageOutcome, SplitCounts};

use std::path::Path;

use image::GenericImageView;
use tracing::{debug, info, warn};

use crate::config::{validate_config, PipelineConfig};
use crate::corpus::enumerate_corpus;
use crate::crops::export_crops;
use crate::encode::{encode_annotations, LabelAllocator};
use crate::error::BoxseedError;
use crate::ir::{ImageRecord, Region};
use crate::manifest::{write_manifest, Manifest};
use crate::propose::{decode_image, RegionProposer};
use crate::split::{route_image, split_corpus, DatasetLayout};

/// Build a dataset from the images in `source` under `output`.
pub fn run_pipeline<P: RegionProposer>(
    source: &Path,
    output: &Path,
    config: &PipelineConfig,
    proposer: &P,
) -> Result<BuildReport, BoxseedError> {
    validate_config(config)?;

    let records = enumerate_corpus(source, config.seed)?;
    let plan = split_corpus(records, config.split_ratio);
    info!(
        source = %source.display(),
        train = plan.train.len(),
        val = plan.val.len(),
        "corpus split"
    );
    if plan.is_empty() {
        warn!(source = %source.display(), "no png/jpg/jpeg images found; writing an empty dataset");
    }

    let layout = DatasetLayout::new(output, &config.crops_dir);
    layout.create_dirs()?;

    let mut report = BuildReport {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        seed: config.seed,
        ..Default::default()
    };
    report.assigned.train = plan.train.len();
    report.assigned.val = plan.val.len();

    let mut allocator = LabelAllocator::new();

    for (split, record) in plan.iter() {
        let image = decode_image(&record.path)?;
        let dims = image.dimensions();

        let regions = proposer.propose(&image);
        ensure_within_image(record, &regions, dims)?;

        if regions.is_empty() {
            debug!(image_id = %record.id, %split, "no regions; image dropped");
            report.record(ImageOutcome {
                image_id: record.id.clone(),
                split,
                regions: 0,
                crops: Vec::new(),
            });
            continue;
        }

        let crops = export_crops(record, &image, &regions, &layout.crops_dir)?;
        let annotations = encode_annotations(record, dims, &regions, &mut allocator);
        route_image(&layout, split, record, &annotations)?;

        debug!(image_id = %record.id, %split, regions = regions.len(), "image routed");
        report.record(ImageOutcome {
            image_id: record.id.clone(),
            split,
            regions: regions.len(),
            crops,
        });
    }

    report.labels_allocated = allocator.allocated();

    let manifest_path = layout.root.join(&config.manifest_name);
    let manifest = Manifest::new(&layout.root, allocator.into_label_map())?;
    write_manifest(&manifest_path, &manifest)?;
    report.manifest = manifest_path;

    add_notes(&mut report);
    info!(
        train = report.kept.train,
        val = report.kept.val,
        skipped = report.skipped_without_regions,
        labels = report.labels_allocated,
        "dataset built"
    );

    Ok(report)
}

fn ensure_within_image(
    record: &ImageRecord,
    regions: &[Region],
    (width, height): (u32, u32),
) -> Result<(), BoxseedError> {
    match regions.iter().find(|r| !r.fits_within(width, height)) {
        Some(region) => Err(BoxseedError::RegionOutOfBounds {
            path: record.path.clone(),
            region: *region,
            width,
            height,
        }),
        None => Ok(()),
    }
}

fn add_notes(report: &mut BuildReport) {
    if report.labels_allocated > 0 {
        let message = format!(
            "{} placeholder label(s) allocated, one per region rather than per category",
            report.labels_allocated
        );
        report.add_note(BuildNoteCode::PerInstanceLabels, message);
    }

    if report.skipped_without_regions > 0 {
        let message = format!(
            "{} image(s) produced no regions and were left out of both splits",
            report.skipped_without_regions
        );
        report.add_note(BuildNoteCode::ImagesWithoutRegionsDropped, message);
    }

    if report.seed.is_none() && report.enumerated() > 1 {
        report.add_note(
            BuildNoteCode::UnseededShuffle,
            "shuffle was unseeded; pass --seed to reproduce this split",
        );
    }
}
