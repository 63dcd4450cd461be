//! Errors surfaced by the runner.

use meander_coords::CoordsError;
use meander_reach::ReachError;
use thiserror::Error;

/// Errors that can occur while running an extraction command.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Reach(#[from] ReachError),

    #[error(transparent)]
    Coords(#[from] CoordsError),

    /// Requested save format is not supported.
    #[error("Format '{0}' not implemented. Use 'json' or 'csv'")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
