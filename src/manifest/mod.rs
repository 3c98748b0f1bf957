//! The dataset manifest handed to the trainer.
//!
//! ```text
//! path: /abs/dataset/root
//! train: images/train
//! val: images/val
//!
//! names:
//!   0: street_object_1
//!   1: street_object_2
//! ```
//!
//! Every placeholder label appears under `names`, so the trainer's class
//! space has one class per proposed region.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BoxseedError;
use crate::ir::{LabelEntry, LabelId, LabelMap, Split};
use crate::split::DatasetLayout;

/// Contents of a dataset manifest.
#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    /// Absolute dataset root.
    pub path: PathBuf,
    /// Train images, relative to `path`.
    pub train: String,
    /// Validation images, relative to `path`.
    pub val: String,
    pub names: LabelMap,
}

impl Manifest {
    /// Manifest for a dataset rooted at `root`. Relative roots are made
    /// absolute against the current directory.
    pub fn new(root: &Path, names: LabelMap) -> Result<Self, BoxseedError> {
        Ok(Self {
            path: std::path::absolute(root).map_err(BoxseedError::Io)?,
            train: DatasetLayout::images_rel(Split::Train),
            val: DatasetLayout::images_rel(Split::Val),
            names,
        })
    }

    /// Render as YAML text.
    pub fn render(&self) -> String {
        let mut yaml = format!(
            "path: {}\ntrain: {}\nval: {}\n\nnames:\n",
            yaml_scalar(&self.path.to_string_lossy()),
            yaml_scalar(&self.train),
            yaml_scalar(&self.val),
        );
        for entry in self.names.iter() {
            yaml.push_str(&format!("  {}: {}\n", entry.id, yaml_scalar(&entry.key)));
        }
        yaml
    }
}

/// Write the manifest to `path`, replacing any existing file.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), BoxseedError> {
    fs::write(path, manifest.render()).map_err(BoxseedError::Io)
}

#[derive(Debug, Deserialize)]
struct ManifestYaml {
    path: PathBuf,
    train: String,
    val: String,
    #[serde(default)]
    names: Option<BTreeMap<u64, String>>,
}

/// Read a manifest back. `names` entries come back in ID order.
pub fn read_manifest(path: &Path) -> Result<Manifest, BoxseedError> {
    let data = fs::read_to_string(path).map_err(BoxseedError::Io)?;
    parse_manifest(&data, path)
}

fn parse_manifest(data: &str, path: &Path) -> Result<Manifest, BoxseedError> {
    let parsed: ManifestYaml =
        serde_yaml::from_str(data).map_err(|source| BoxseedError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    let names = parsed
        .names
        .unwrap_or_default()
        .into_iter()
        .map(|(id, key)| LabelEntry {
            id: LabelId::new(id),
            key,
        })
        .collect();

    Ok(Manifest {
        path: parsed.path,
        train: parsed.train,
        val: parsed.val,
        names,
    })
}

/// Fuzz-only entrypoint for manifest parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_manifest(input: &str) -> Result<(), BoxseedError> {
    let _ = parse_manifest(input, Path::new("<fuzz>"))?;
    Ok(())
}

// Plain scalars for simple keys, single quotes for anything YAML might
// reinterpret.
fn yaml_scalar(raw: &str) -> String {
    let plain = raw
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/')
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'));

    if plain {
        raw.to_string()
    } else {
        format!("'{}'", raw.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_map(keys: &[&str]) -> LabelMap {
        keys.iter()
            .enumerate()
            .map(|(i, key)| LabelEntry {
                id: LabelId::new(i as u64),
                key: key.to_string(),
            })
            .collect()
    }

    #[test]
    fn render_lists_names_in_order() {
        let manifest = Manifest {
            path: PathBuf::from("/data/ds"),
            train: "images/train".to_string(),
            val: "images/val".to_string(),
            names: label_map(&["b_object_1", "a_object_1", "a_object_2"]),
        };

        assert_eq!(
            manifest.render(),
            "path: /data/ds\ntrain: images/train\nval: images/val\n\nnames:\n  \
             0: b_object_1\n  1: a_object_1\n  2: a_object_2\n"
        );
    }

    #[test]
    fn render_quotes_awkward_keys() {
        assert_eq!(yaml_scalar("cat_object_1"), "cat_object_1");
        assert_eq!(yaml_scalar("my photo_object_1"), "'my photo_object_1'");
        assert_eq!(yaml_scalar("it's_object_1"), "'it''s_object_1'");
        assert_eq!(yaml_scalar("#1_object_1"), "'#1_object_1'");
    }

    #[test]
    fn manifest_new_makes_root_absolute() {
        let manifest = Manifest::new(Path::new("relative/ds"), LabelMap::new()).expect("manifest");
        assert!(manifest.path.is_absolute());
        assert!(manifest.path.ends_with("relative/ds"));
        assert_eq!(manifest.train, "images/train");
        assert_eq!(manifest.val, "images/val");
    }

    #[test]
    fn written_manifest_reads_back() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let manifest = Manifest::new(
            temp.path(),
            label_map(&["x_object_1", "odd name: 1_object_1"]),
        )
        .expect("manifest");

        let path = temp.path().join("dataset.yaml");
        write_manifest(&path, &manifest).expect("write manifest");
        let restored = read_manifest(&path).expect("read manifest");
        assert_eq!(restored, manifest);
    }

    #[test]
    fn empty_names_block_reads_back() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let manifest = Manifest::new(temp.path(), LabelMap::new()).expect("manifest");
        let path = temp.path().join("dataset.yaml");
        write_manifest(&path, &manifest).expect("write manifest");

        let restored = read_manifest(&path).expect("read manifest");
        assert!(restored.names.is_empty());
    }

    #[test]
    fn malformed_manifest_is_reported() {
        let err = parse_manifest("path: [unclosed", Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, BoxseedError::ManifestParse { .. }));
    }
}
