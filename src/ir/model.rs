//! Core records flowing through the dataset-assembly pipeline.
//!
//! An [`ImageRecord`] is produced once by the corpus enumerator and never
//! changes afterwards. Regions and annotations are derived from it fresh on
//! every run; only the files written from them persist.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::bbox::NormalizedBox;
use super::ids::{ImageId, LabelId};
use crate::error::BoxseedError;

/// A source image eligible for the dataset.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    /// File stem, used to name label files, crops and label keys.
    pub id: ImageId,

    /// Full path to the source file.
    pub path: PathBuf,

    /// File name including extension, as copied into the split directory.
    pub file_name: String,

    dimensions: OnceLock<(u32, u32)>,
}

impl ImageRecord {
    /// Creates a record for `path`, deriving the id from its file stem.
    ///
    /// Returns `None` when the path has no UTF-8 file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        let stem = path.file_stem()?.to_str()?.to_string();

        Some(Self {
            id: ImageId::new(stem),
            path,
            file_name,
            dimensions: OnceLock::new(),
        })
    }

    /// Returns `(width, height)` in pixels.
    ///
    /// Only the file header is read, on first call; the result is cached.
    pub fn dimensions(&self) -> Result<(u32, u32), BoxseedError> {
        if let Some(dims) = self.dimensions.get() {
            return Ok(*dims);
        }

        let dims = read_image_dimensions(&self.path)?;
        let _ = self.dimensions.set(dims);
        Ok(dims)
    }
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), BoxseedError> {
    let size = imagesize::size(path).map_err(|source| BoxseedError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    checked_dimensions(path, size.width, size.height)
}

fn checked_dimensions(path: &Path, width: usize, height: usize) -> Result<(u32, u32), BoxseedError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(BoxseedError::ImageTooLarge {
            path: path.to_path_buf(),
            width,
            height,
        }),
    }
}

/// The two dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    /// Directory name under `images/` and `labels/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }

    /// Both splits, in processing order.
    pub fn all() -> [Split; 2] {
        [Split::Train, Split::Val]
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One label-file row: a placeholder class and a normalized box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub label_id: LabelId,
    pub bbox: NormalizedBox,
}

impl Annotation {
    pub fn new(label_id: impl Into<LabelId>, bbox: NormalizedBox) -> Self {
        Self {
            label_id: label_id.into(),
            bbox,
        }
    }
}

/// A single label map row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub id: LabelId,
    pub key: String,
}

/// Placeholder label IDs in allocation order, each with its
/// `{image_id}_object_{n}` key.
///
/// Entries are only ever appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    entries: Vec<LabelEntry>,
}

impl LabelMap {
    /// Creates an empty label map.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: LabelId, key: String) {
        self.entries.push(LabelEntry { id, key });
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.iter()
    }

    /// Looks up the key recorded for `id`.
    pub fn key_of(&self, id: LabelId) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.key.as_str())
    }
}

impl FromIterator<LabelEntry> for LabelMap {
    fn from_iter<I: IntoIterator<Item = LabelEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
