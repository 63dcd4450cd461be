//! # meander-runner
//!
//! Command-line front end for reach extraction: loads a segment catalog and
//! a directory of coordinate tiles from a YAML config, runs single reaches
//! or every headwater reach of a hydrologic unit, and saves the chain, the
//! stitched profile and the fitted curve as JSON or CSV.

mod config;
mod error;
mod output;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use output::{
    output_path, save_extraction, write_chain, write_curve, write_profile, SaveFormat,
};

use meander_coords::CoordinateManager;
use meander_reach::{ReachExtractor, SegmentCatalog, SegmentId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load a catalog, choosing the reader from the file extension.
///
/// `.json` files hold an array of segment records; anything else is read as
/// a value-added attribute CSV.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<SegmentCatalog, RunnerError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let catalog = if is_json {
        SegmentCatalog::from_json_path(path)?
    } else {
        SegmentCatalog::from_csv_path(path)?
    };
    debug!(path = %path.display(), json = is_json, "catalog source");
    Ok(catalog)
}

/// Index the coordinate tiles in `dir`.
pub fn open_coordinates<P: AsRef<Path>>(
    dir: P,
    cache_size: usize,
) -> Result<CoordinateManager, RunnerError> {
    let mut manager = CoordinateManager::with_cache_size(cache_size);
    let count = manager.add_directory(dir.as_ref())?;
    if count == 0 {
        warn!(dir = %dir.as_ref().display(), "no coordinate tiles found");
    }
    Ok(manager)
}

/// Outcome of extracting every headwater reach of one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub unit: String,
    pub succeeded: Vec<SegmentId>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub start: SegmentId,
    pub error: String,
}

/// Loaded inputs for a run.
pub struct Workspace {
    config: RunnerConfig,
    catalog: SegmentCatalog,
    coordinates: CoordinateManager,
}

impl Workspace {
    /// Load the catalog and index the tiles named by `config`.
    pub fn open(config: RunnerConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let catalog = load_catalog(&config.catalog)?;
        let coordinates = open_coordinates(&config.coordinates, config.tile_cache_size)?;
        Ok(Self {
            config,
            catalog,
            coordinates,
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }

    pub fn coordinates(&self) -> &CoordinateManager {
        &self.coordinates
    }

    /// Extractor borrowing this workspace's catalog and tiles.
    pub fn extractor(&self) -> Result<ReachExtractor<'_, &CoordinateManager>, RunnerError> {
        Ok(ReachExtractor::new(
            &self.catalog,
            &self.coordinates,
            self.config.extraction.clone(),
        )?)
    }

    /// Extract one reach and save its artifacts to the output directory.
    pub fn run_reach(&self, start: SegmentId) -> Result<Vec<PathBuf>, RunnerError> {
        let extraction = self.extractor()?.extract_reach(start)?;
        save_extraction(
            &self.config.output_dir,
            start,
            &extraction,
            self.config.save_format,
        )
    }

    /// Extract and save every headwater reach of `unit`.
    ///
    /// Failed reaches are collected in the summary; only output errors
    /// abort the batch.
    pub fn run_unit(&self, unit: &str) -> Result<BatchSummary, RunnerError> {
        let extractor = self.extractor()?;
        let mut summary = BatchSummary {
            unit: unit.to_string(),
            ..Default::default()
        };

        for (start, result) in extractor.assemble_headwaters(unit) {
            match result {
                Ok(extraction) => {
                    save_extraction(
                        &self.config.output_dir,
                        start,
                        &extraction,
                        self.config.save_format,
                    )?;
                    summary.succeeded.push(start);
                }
                Err(e) => summary.failed.push(BatchFailure {
                    start,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            unit,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "batch complete"
        );
        Ok(summary)
    }
}
