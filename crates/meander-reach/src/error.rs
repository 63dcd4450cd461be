//! Error types for reach assembly.

use crate::SegmentId;
use meander_coords::CoordsError;
use std::fmt;
use thiserror::Error;

/// Errors that abort one reach assembly.
///
/// Assembly is all-or-nothing: none of these leave partial output behind, and
/// none affect the catalog or other assemblies.
#[derive(Debug, Error)]
pub enum ReachError {
    /// A referenced segment does not exist in the catalog.
    #[error("Segment {segment} not found in catalog")]
    NotFound {
        /// Requested segment.
        segment: SegmentId,
    },

    /// A chain member has no geometry in its coordinate tile.
    #[error("No geometry for segment {segment} in tile {huc}")]
    DataGap {
        /// Segment whose polyline is missing or empty.
        segment: SegmentId,
        /// Tile that was searched.
        huc: String,
    },

    /// Not enough points for the requested spline degree.
    #[error("Insufficient data: need at least {required} distinct points, found {found}")]
    InsufficientData {
        /// Minimum number of points.
        required: usize,
        /// Number of points available.
        found: usize,
    },

    /// The network topology violates the single-successor, acyclic assumption.
    #[error("Network inconsistency at segment {segment}: {issue}")]
    NetworkInconsistency {
        /// Segment at which the walk failed.
        segment: SegmentId,
        /// What went wrong.
        issue: NetworkIssue,
    },

    /// A segment's hydrologic unit code is coarser than the requested level.
    #[error("Segment {segment} has no hydrologic unit code at {level} digits")]
    UnitUnavailable {
        /// Segment being resolved.
        segment: SegmentId,
        /// Requested number of digits.
        level: u8,
    },

    /// A spline was queried outside its data range.
    #[error("Position {position} is outside the fitted range")]
    OutOfRange {
        /// Requested arc-length position.
        position: f64,
    },

    /// A profile handed to the fitter breaks its invariants.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Catalog contents are malformed.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Extraction settings are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Coordinate tile error other than a missing tile.
    #[error("Coordinate error: {0}")]
    Coords(#[from] CoordsError),

    /// I/O error reading a catalog.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decode error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of topology violation found during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkIssue {
    /// More than one segment starts at the current segment's downstream node.
    AmbiguousSuccessor {
        /// All matching segments, in catalog order.
        candidates: Vec<SegmentId>,
    },
    /// The walk came back to a segment it already visited.
    Cycle {
        /// The revisited segment.
        revisited: SegmentId,
    },
    /// The walk exceeded the configured maximum length.
    WalkLimit {
        /// Configured maximum chain length.
        limit: usize,
    },
}

impl fmt::Display for NetworkIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkIssue::AmbiguousSuccessor { candidates } => {
                let ids: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
                write!(f, "ambiguous downstream successors [{}]", ids.join(", "))
            }
            NetworkIssue::Cycle { revisited } => write!(f, "cycle back to segment {}", revisited),
            NetworkIssue::WalkLimit { limit } => write!(f, "walk exceeded {} segments", limit),
        }
    }
}
