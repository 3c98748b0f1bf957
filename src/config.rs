//! Pipeline configuration.
//!
//! Every setting has a default matching the classic pipeline. A YAML file
//! can override any subset of them, and CLI flags override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::BoxseedError;

/// Default fraction of the shuffled corpus assigned to training.
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;
/// Regions whose width or height is at most this many pixels are dropped.
pub const DEFAULT_MIN_SIZE: u32 = 20;
pub const DEFAULT_LOW_THRESHOLD: f32 = 50.0;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 150.0;
pub const DEFAULT_CROPS_DIR: &str = "unknown_objects";
pub const DEFAULT_MANIFEST_NAME: &str = "dataset.yaml";

/// Settings for the edge/contour region proposer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposerConfig {
    /// Canny hysteresis low threshold, on an 8-bit intensity scale.
    pub low_threshold: f32,
    /// Canny hysteresis high threshold, on an 8-bit intensity scale.
    pub high_threshold: f32,
    /// Minimum side length; a region must be strictly larger on both axes.
    pub min_size: u32,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_LOW_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

/// Settings for a full dataset build.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of the shuffled corpus assigned to training, in `(0, 1]`.
    pub split_ratio: f64,

    /// Shuffle seed. `None` draws from the thread RNG, so split membership
    /// differs between runs.
    pub seed: Option<u64>,

    #[serde(flatten)]
    pub proposer: ProposerConfig,

    /// Name of the crop-review directory under the dataset root.
    pub crops_dir: String,

    /// File name of the manifest under the dataset root.
    pub manifest_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split_ratio: DEFAULT_SPLIT_RATIO,
            seed: None,
            proposer: ProposerConfig::default(),
            crops_dir: DEFAULT_CROPS_DIR.to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }
}

/// Load a config file. Missing keys take their defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig, BoxseedError> {
    let data = fs::read_to_string(path).map_err(BoxseedError::Io)?;
    serde_yaml::from_str(&data).map_err(|source| BoxseedError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate configuration before running.
pub fn validate_config(config: &PipelineConfig) -> Result<(), BoxseedError> {
    if !(config.split_ratio > 0.0 && config.split_ratio <= 1.0) {
        return Err(BoxseedError::InvalidConfig {
            message: format!(
                "split ratio must be in the interval (0.0, 1.0], got {}",
                config.split_ratio
            ),
        });
    }

    validate_proposer_config(&config.proposer)?;
    validate_entry_name("crops directory", &config.crops_dir)?;
    validate_entry_name("manifest name", &config.manifest_name)?;

    Ok(())
}

/// Validate proposer thresholds.
pub fn validate_proposer_config(config: &ProposerConfig) -> Result<(), BoxseedError> {
    let (low, high) = (config.low_threshold, config.high_threshold);

    if !low.is_finite() || !high.is_finite() || low < 0.0 || high < 0.0 {
        return Err(BoxseedError::InvalidConfig {
            message: format!("edge thresholds must be finite and non-negative, got {low}/{high}"),
        });
    }

    if low > high {
        return Err(BoxseedError::InvalidConfig {
            message: format!("low threshold {low} exceeds high threshold {high}"),
        });
    }

    Ok(())
}

fn validate_entry_name(what: &str, name: &str) -> Result<(), BoxseedError> {
    if name.trim().is_empty() {
        return Err(BoxseedError::InvalidConfig {
            message: format!("{what} must not be empty"),
        });
    }

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(BoxseedError::InvalidConfig {
            message: format!("{what} '{name}' must be a single path component"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pipeline() {
        let config = PipelineConfig::default();
        assert_eq!(config.split_ratio, 0.8);
        assert_eq!(config.seed, None);
        assert_eq!(config.proposer.min_size, 20);
        assert_eq!(config.proposer.low_threshold, 50.0);
        assert_eq!(config.proposer.high_threshold, 150.0);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("seed: 7\nmin_size: 32\n").expect("parse config");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.proposer.min_size, 32);
        assert_eq!(config.split_ratio, 0.8);
        assert_eq!(config.crops_dir, "unknown_objects");
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "split_ratio: [not, a, number]\n").expect("write config");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, BoxseedError::ConfigParse { .. }));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let config = PipelineConfig {
                split_ratio: ratio,
                ..Default::default()
            };
            assert!(validate_config(&config).is_err(), "ratio {ratio} accepted");
        }

        let all_train = PipelineConfig {
            split_ratio: 1.0,
            ..Default::default()
        };
        assert!(validate_config(&all_train).is_ok());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let config = ProposerConfig {
            low_threshold: 200.0,
            high_threshold: 100.0,
            ..Default::default()
        };
        assert!(validate_proposer_config(&config).is_err());
    }

    #[test]
    fn rejects_nested_directory_names() {
        let config = PipelineConfig {
            crops_dir: "review/crops".to_string(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
