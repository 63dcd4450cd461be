//! # meander-coords
//!
//! River segment geometry stored as per-hydrologic-unit coordinate tiles.
//!
//! The NHDPlus flowline geometry is split into one file per hydrologic unit
//! (HUC). Each file maps segment identifiers to their polyline in projected
//! coordinates. This crate provides:
//! - [`CoordinateTile`]: one decoded tile
//! - [`CoordinateManager`]: a directory index that decodes tiles on demand and
//!   keeps recently used ones in an LRU cache
//! - [`CoordinateSource`]: the trait reach assembly uses to request tiles, so
//!   tests and embedding callers can supply geometry from memory
//!   ([`InMemorySource`])
//!
//! ## Example
//!
//! ```no_run
//! use meander_coords::{CoordinateManager, CoordinateSource, SegmentId};
//!
//! let mut manager = CoordinateManager::with_cache_size(4);
//! manager.add_directory("coordinates")?;
//!
//! let tile = manager.load_tile("0601")?;
//! println!("tile {} holds {} segments", tile.huc(), tile.len());
//! # Ok::<(), meander_coords::CoordsError>(())
//! ```

mod error;
mod manager;
mod source;
mod tile;

pub use error::CoordsError;
pub use manager::{tile_filename, CoordinateManager, DEFAULT_MAX_CACHE_SIZE, TILE_SUFFIX};
pub use source::{CoordinateSource, InMemorySource};
pub use tile::{CoordinateTile, Point, Polyline, SegmentId};

/// Result type for coordinate operations.
pub type Result<T> = std::result::Result<T, CoordsError>;
