//! # meander-reach
//!
//! Assembles continuous river reaches from a tiled hydrography dataset and
//! produces a smooth, arc-length parameterized curve `(x, y, z)` for meander
//! analysis.
//!
//! ## Pipeline
//!
//! 1. [`walk`]: follow the network downstream from a start segment, inside
//!    one hydrologic unit, collecting the ordered [`ReachChain`].
//! 2. [`stitch`]: fetch the chain's polylines from their coordinate tiles
//!    (one load per tile), drop shared endpoints, compute cumulative arc
//!    length and reconstruct elevation from slope and max elevation,
//!    yielding a [`StitchedProfile`].
//! 3. [`fit_and_resample`]: interpolating splines for x, y (cubic) and z
//!    (linear), resampled on a uniform grid whose step is the finest native
//!    spacing, yielding a [`FittedCurve`] that also labels each point with
//!    its source segment.
//!
//! [`ReachExtractor`] ties the three steps together.
//!
//! Every step is a pure function of its inputs; failures abort only the
//! reach being assembled (see [`ReachError`]).

mod catalog;
mod config;
mod error;
mod extractor;
mod fit;
mod huc;
pub mod spline;
mod stitch;
mod walker;

pub use catalog::{NodeId, Segment, SegmentCatalog};
pub use config::{ExtractionConfig, DEFAULT_ELEVATION_DIVISOR, DEFAULT_MAX_GRID_POINTS};
pub use error::{NetworkIssue, ReachError};
pub use extractor::{ReachExtraction, ReachExtractor};
pub use fit::{arc_length_grid, fit_and_resample, FittedCurve};
pub use huc::{HucCode, HucLevel};
pub use stitch::{stitch, ProfilePoint, SegmentSpan, StitchedProfile};
pub use walker::{walk, ReachChain};

pub use meander_coords::{Point, Polyline, SegmentId};

/// Result type for reach operations.
pub type Result<T> = std::result::Result<T, ReachError>;
