//! Build report types.
//!
//! A [`BuildReport`] records what a pipeline run enumerated, kept and
//! dropped, plus notes about behavior a reader of the dataset should know.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::ir::{ImageId, Split};

/// Summary of one dataset build.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub manifest: PathBuf,
    pub seed: Option<u64>,
    /// Split sizes before the zero-region filter.
    pub assigned: SplitCounts,
    /// Images actually written to each split.
    pub kept: SplitCounts,
    pub skipped_without_regions: usize,
    pub regions: usize,
    pub crops_written: usize,
    pub labels_allocated: u64,
    pub images: Vec<ImageOutcome>,
    pub notes: Vec<BuildNote>,
}

impl BuildReport {
    /// Images found in the source directory.
    pub fn enumerated(&self) -> usize {
        self.assigned.total()
    }

    pub fn add_note(&mut self, code: BuildNoteCode, message: impl Into<String>) {
        self.notes.push(BuildNote {
            code,
            message: message.into(),
        });
    }

    pub(crate) fn record(&mut self, outcome: ImageOutcome) {
        if outcome.regions == 0 {
            self.skipped_without_regions += 1;
        } else {
            match outcome.split {
                Split::Train => self.kept.train += 1,
                Split::Val => self.kept.val += 1,
            }
            self.regions += outcome.regions;
            self.crops_written += outcome.crops.len();
        }
        self.images.push(outcome);
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset built in {}", self.output.display())?;
        writeln!(
            f,
            "  enumerated: {} images ({} train, {} val)",
            self.enumerated(),
            self.assigned.train,
            self.assigned.val
        )?;
        writeln!(
            f,
            "  kept: {} train, {} val ({} skipped without regions)",
            self.kept.train, self.kept.val, self.skipped_without_regions
        )?;
        writeln!(
            f,
            "  regions: {}, crops: {}, labels: {}",
            self.regions, self.crops_written, self.labels_allocated
        )?;
        writeln!(f, "  manifest: {}", self.manifest.display())?;

        if !self.notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", self.notes.len())?;
            for note in &self.notes {
                writeln!(f, "  - {}", note.message)?;
            }
        }

        Ok(())
    }
}

/// Image counts per split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: usize,
    pub val: usize,
}

impl SplitCounts {
    pub fn total(&self) -> usize {
        self.train + self.val
    }
}

/// What happened to a single source image.
#[derive(Clone, Debug, Serialize)]
pub struct ImageOutcome {
    pub image_id: ImageId,
    pub split: Split,
    pub regions: usize,
    /// Crop file names, in region order. Empty when the image was skipped.
    pub crops: Vec<String>,
}

/// A note about the built dataset.
#[derive(Clone, Debug, Serialize)]
pub struct BuildNote {
    pub code: BuildNoteCode,
    pub message: String,
}

/// Stable note codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildNoteCode {
    /// Every region got its own label ID; the label space equals the instance count.
    PerInstanceLabels,
    /// Some images produced no regions and are absent from both splits.
    ImagesWithoutRegionsDropped,
    /// The shuffle was unseeded; split membership will differ on the next run.
    UnseededShuffle,
}
