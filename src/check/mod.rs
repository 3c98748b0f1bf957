//! Consistency checks for a built dataset.
//!
//! The check re-reads what a build wrote and verifies:
//! - every label file pairs with a copied image and vice versa
//! - every label line parses and its values lie in [0, 1]
//! - label IDs are unique and listed in the manifest
//! - each image has as many crops as label lines

mod report;

pub use report::{CheckIssue, CheckReport, IssueCode, IssueContext, Severity};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{DEFAULT_CROPS_DIR, DEFAULT_MANIFEST_NAME};
use crate::corpus::collect_images;
use crate::crops::CROP_EXTENSION;
use crate::encode::{parse_label_line, LABEL_EXTENSION};
use crate::error::BoxseedError;
use crate::ir::{ImageId, LabelId, Split};
use crate::manifest::read_manifest;
use crate::split::DatasetLayout;

/// Options for a dataset check.
#[derive(Clone, Debug)]
pub struct CheckOptions {
    pub crops_dir: String,
    pub manifest_name: String,
    /// If true, warnings fail the check too.
    pub strict: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            crops_dir: DEFAULT_CROPS_DIR.to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            strict: false,
        }
    }
}

/// Check the dataset rooted at `root`.
///
/// Problems with the dataset's contents become issues in the report; only
/// a missing or unparseable manifest or an unreadable directory is an `Err`.
pub fn check_dataset(root: &Path, opts: &CheckOptions) -> Result<CheckReport, BoxseedError> {
    let layout = DatasetLayout::new(root, &opts.crops_dir);
    let manifest = read_manifest(&root.join(&opts.manifest_name))?;
    let manifest_ids: HashSet<LabelId> = manifest.names.iter().map(|e| e.id).collect();

    let mut report = CheckReport::new();
    let mut seen_ids: HashMap<LabelId, String> = HashMap::new();

    for split in Split::all() {
        let images = copied_images(&layout, split, &mut report)?;
        let labels = label_files(&layout.labels_dir(split))?;

        for (id, file) in &images {
            if !labels.contains_key(id) {
                report.add(CheckIssue::error(
                    IssueCode::ImageWithoutLabels,
                    "copied image has no label file",
                    IssueContext::Image { file: file.clone() },
                ));
            }
        }

        for (id, path) in &labels {
            let file = rel_string(root, path);
            if !images.contains_key(id) {
                report.add(CheckIssue::error(
                    IssueCode::LabelWithoutImage,
                    format!("no image named '{}.*' in images/{}", id, split),
                    IssueContext::LabelFile { file: file.clone() },
                ));
            }

            let Some(line_count) =
                check_label_file(path, &file, &manifest_ids, &mut seen_ids, &mut report)?
            else {
                continue;
            };
            check_crop_count(&layout.crops_dir, id, line_count, &file, &mut report);
        }
    }

    let mut unused: Vec<LabelId> = manifest_ids
        .iter()
        .filter(|id| !seen_ids.contains_key(id))
        .copied()
        .collect();
    unused.sort();
    for id in unused {
        report.add(CheckIssue::warning(
            IssueCode::UnusedManifestEntry,
            format!(
                "manifest entry '{}' is not used by any label line",
                manifest.names.key_of(id).unwrap_or_default()
            ),
            IssueContext::Label { id: id.as_u64() },
        ));
    }

    Ok(report)
}

fn copied_images(
    layout: &DatasetLayout,
    split: Split,
    report: &mut CheckReport,
) -> Result<BTreeMap<ImageId, String>, BoxseedError> {
    let mut images = BTreeMap::new();

    for record in collect_images(&layout.images_dir(split))? {
        let file = rel_string(&layout.root, &record.path);
        if let Err(err) = record.dimensions() {
            report.add(CheckIssue::error(
                IssueCode::UnreadableImage,
                err.to_string(),
                IssueContext::Image { file: file.clone() },
            ));
        }
        images.insert(record.id, file);
    }

    Ok(images)
}

fn label_files(dir: &Path) -> Result<BTreeMap<ImageId, PathBuf>, BoxseedError> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| BoxseedError::SourceDirInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        let path = entry.path();
        let is_label = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == LABEL_EXTENSION);
        if !entry.file_type().is_file() || !is_label {
            continue;
        }

        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.insert(ImageId::new(stem), path.to_path_buf());
        }
    }

    Ok(files)
}

// Returns the number of label lines, or `None` if the file was malformed.
fn check_label_file(
    path: &Path,
    file: &str,
    manifest_ids: &HashSet<LabelId>,
    seen_ids: &mut HashMap<LabelId, String>,
    report: &mut CheckReport,
) -> Result<Option<usize>, BoxseedError> {
    let content = std::fs::read_to_string(path).map_err(BoxseedError::Io)?;
    report.label_files += 1;

    let mut lines = 0;
    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let context = || IssueContext::Line {
            file: file.to_string(),
            line: line_num,
        };

        let annotation = match parse_label_line(line, path, line_num) {
            Ok(Some(annotation)) => annotation,
            Ok(None) => continue,
            Err(err) => {
                report.add(CheckIssue::error(
                    IssueCode::MalformedLabelLine,
                    err.to_string(),
                    context(),
                ));
                return Ok(None);
            }
        };
        lines += 1;
        report.label_lines += 1;

        if !annotation.bbox.is_within_unit() {
            let (cx, cy, w, h) = annotation.bbox.to_cxcywh();
            report.add(CheckIssue::error(
                IssueCode::CoordinateOutOfRange,
                format!("values ({cx}, {cy}, {w}, {h}) are not all within [0, 1]"),
                context(),
            ));
        }

        let id = annotation.label_id;
        if let Some(first) = seen_ids.get(&id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateLabelId,
                format!("label {} already used in {}", id, first),
                context(),
            ));
        } else {
            seen_ids.insert(id, file.to_string());
        }

        if !manifest_ids.contains(&id) {
            report.add(CheckIssue::error(
                IssueCode::UnknownLabelId,
                format!("label {} is not listed in the manifest", id),
                context(),
            ));
        }
    }

    Ok(Some(lines))
}

fn check_crop_count(
    crops_dir: &Path,
    id: &ImageId,
    line_count: usize,
    file: &str,
    report: &mut CheckReport,
) {
    let crop_exists = |n: usize| {
        crops_dir
            .join(format!("{}.{}", id.object_key(n), CROP_EXTENSION))
            .is_file()
    };

    let present = (1..=line_count).filter(|&n| crop_exists(n)).count();
    let extra = crop_exists(line_count + 1);

    if present != line_count || extra {
        report.add(CheckIssue::warning(
            IssueCode::CropCountMismatch,
            format!(
                "{} label line(s) but {}{} matching crop(s)",
                line_count,
                present,
                if extra { "+" } else { "" }
            ),
            IssueContext::LabelFile {
                file: file.to_string(),
            },
        ));
    }
}

fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
