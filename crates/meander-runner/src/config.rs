//! Runner configuration loaded from YAML.
//!
//! ```yaml
//! catalog: data/vaa_0601.csv
//! coordinates: data/coordinates
//! output_dir: out
//! save_format: csv
//! tile_cache_size: 8
//! extraction:
//!   hu_level: 4
//!   tile_level: 4
//!   min_fit_points: 4
//! ```

use crate::{RunnerError, SaveFormat};
use meander_coords::DEFAULT_MAX_CACHE_SIZE;
use meander_reach::ExtractionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything a run needs besides the command itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Segment attribute table (`.csv` or `.json`).
    pub catalog: PathBuf,
    /// Directory of `HUC{nn}_{code}_coordinates.json` tiles.
    pub coordinates: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub save_format: SaveFormat,
    #[serde(default = "default_tile_cache_size")]
    pub tile_cache_size: usize,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_tile_cache_size() -> usize {
    DEFAULT_MAX_CACHE_SIZE
}

impl RunnerConfig {
    /// Config with defaults for everything except the input paths.
    pub fn new(catalog: impl Into<PathBuf>, coordinates: impl Into<PathBuf>) -> Self {
        Self {
            catalog: catalog.into(),
            coordinates: coordinates.into(),
            output_dir: default_output_dir(),
            save_format: SaveFormat::default(),
            tile_cache_size: default_tile_cache_size(),
            extraction: ExtractionConfig::default(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, RunnerError> {
        let config: RunnerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RunnerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.tile_cache_size == 0 {
            return Err(RunnerError::Config("tile_cache_size must be at least 1".to_string()));
        }
        self.extraction.validate()?;
        Ok(())
    }
}
