//! Error types for the coordinate crate.

use thiserror::Error;

/// Errors that can occur when working with coordinate tiles.
#[derive(Debug, Error)]
pub enum CoordsError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tile file is not valid JSON or has the wrong shape.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid tile filename - cannot parse the hydrologic unit code.
    #[error("Invalid tile filename: {0}")]
    InvalidFilename(String),

    /// No tile indexed for the given hydrologic unit.
    #[error("No coordinate tile found for hydrologic unit {huc}")]
    NoTileFound {
        /// Requested hydrologic unit code.
        huc: String,
    },

    /// A segment key or its coordinate arrays could not be interpreted.
    #[error("Malformed polyline for segment {segment}: {reason}")]
    MalformedPolyline {
        /// Segment key as it appears in the tile.
        segment: String,
        /// Reason for rejection.
        reason: String,
    },

    /// Cache lock was poisoned (a thread panicked while holding the lock).
    #[error("Tile cache lock was poisoned")]
    CacheLockPoisoned,
}
