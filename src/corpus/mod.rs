//! Corpus enumeration and shuffling.
//!
//! The enumerator takes one snapshot of the source directory. That snapshot
//! is shuffled once and then split, so train/val membership is consistent
//! for the whole run.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::BoxseedError;
use crate::ir::ImageRecord;

/// Extensions (case-insensitive) the enumerator accepts.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// List eligible images directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. An empty directory yields an
/// empty list.
pub fn collect_images(dir: &Path) -> Result<Vec<ImageRecord>, BoxseedError> {
    if !dir.is_dir() {
        return Err(BoxseedError::SourceDirInvalid {
            path: dir.to_path_buf(),
            message: "source must be an existing directory".to_string(),
        });
    }

    let mut records = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| BoxseedError::SourceDirInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
            continue;
        }

        match ImageRecord::from_path(entry.path()) {
            Some(record) => records.push(record),
            None => debug!(path = %entry.path().display(), "skipping non UTF-8 file name"),
        }
    }

    warn_on_duplicate_ids(&records);
    Ok(records)
}

/// Returns true if the file name ends in one of [`IMAGE_EXTENSIONS`].
pub fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Shuffle in place. With `seed == None` the order differs on every call.
pub fn shuffle_records(records: &mut [ImageRecord], seed: Option<u64>) {
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        records.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        records.shuffle(&mut rng);
    }
}

/// Enumerate `dir` and shuffle the result.
pub fn enumerate_corpus(dir: &Path, seed: Option<u64>) -> Result<Vec<ImageRecord>, BoxseedError> {
    let mut records = collect_images(dir)?;
    shuffle_records(&mut records, seed);
    debug!(count = records.len(), seeded = seed.is_some(), "enumerated corpus");
    Ok(records)
}

// Images sharing a stem write to the same label file and crop names; the
// later one wins.
fn warn_on_duplicate_ids(records: &[ImageRecord]) {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for record in records {
        if let Some(first) = seen.insert(record.id.as_str(), record.file_name.as_str()) {
            warn!(
                image_id = %record.id,
                first = first,
                second = %record.file_name,
                "two source images share an id; their outputs will collide"
            );
        }
    }
}
