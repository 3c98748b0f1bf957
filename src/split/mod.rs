//! Train/val partitioning and the on-disk dataset layout.
//!
//! The split is decided on the shuffled corpus before any detection runs:
//! the first `floor(ratio * n)` records train, the rest validate. Images
//! that later turn out to have no regions are simply never routed, so the
//! written dataset can be smaller than either half of the plan.

use std::fs;
use std::path::{Path, PathBuf};

use crate::encode::{label_file_name, write_label_file};
use crate::error::BoxseedError;
use crate::ir::{Annotation, ImageRecord, Split};

/// Number of records assigned to training.
pub fn split_index(len: usize, ratio: f64) -> usize {
    ((len as f64 * ratio).floor() as usize).min(len)
}

/// The corpus partitioned into train and val, each in shuffled order.
#[derive(Clone, Debug, Default)]
pub struct SplitPlan {
    pub train: Vec<ImageRecord>,
    pub val: Vec<ImageRecord>,
}

impl SplitPlan {
    /// Total records in the plan.
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    /// Returns true if neither split holds a record.
    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty()
    }

    /// All records with their split, train first.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &ImageRecord)> {
        self.train
            .iter()
            .map(|r| (Split::Train, r))
            .chain(self.val.iter().map(|r| (Split::Val, r)))
    }
}

/// Partition an already shuffled corpus.
pub fn split_corpus(mut records: Vec<ImageRecord>, ratio: f64) -> SplitPlan {
    let index = split_index(records.len(), ratio);
    let val = records.split_off(index);
    SplitPlan {
        train: records,
        val,
    }
}

/// Directory layout of a built dataset.
///
/// ```text
/// <root>/
///   images/{train,val}/
///   labels/{train,val}/
///   <crops_dir>/
/// ```
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub crops_dir: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>, crops_dir_name: &str) -> Self {
        let root = root.into();
        let crops_dir = root.join(crops_dir_name);
        Self { root, crops_dir }
    }

    /// Image path relative to the root, as written into the manifest.
    pub fn images_rel(split: Split) -> String {
        format!("images/{}", split.dir_name())
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root.join("images").join(split.dir_name())
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.root.join("labels").join(split.dir_name())
    }

    /// Create every directory of the layout.
    pub fn create_dirs(&self) -> Result<(), BoxseedError> {
        for split in Split::all() {
            fs::create_dir_all(self.images_dir(split)).map_err(BoxseedError::Io)?;
            fs::create_dir_all(self.labels_dir(split)).map_err(BoxseedError::Io)?;
        }
        fs::create_dir_all(&self.crops_dir).map_err(BoxseedError::Io)
    }
}

/// Copy the source image and write its label file into `split`.
///
/// Returns `false` without touching the filesystem when there are no
/// annotations.
pub fn route_image(
    layout: &DatasetLayout,
    split: Split,
    record: &ImageRecord,
    annotations: &[Annotation],
) -> Result<bool, BoxseedError> {
    if annotations.is_empty() {
        return Ok(false);
    }

    copy_verbatim(&record.path, &layout.images_dir(split).join(&record.file_name))?;

    let label_path = layout.labels_dir(split).join(label_file_name(record));
    write_label_file(&label_path, annotations)?;

    Ok(true)
}

fn copy_verbatim(from: &Path, to: &Path) -> Result<(), BoxseedError> {
    fs::copy(from, to).map_err(BoxseedError::Io)?;
    Ok(())
}
