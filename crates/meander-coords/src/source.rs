//! Abstraction over where coordinate tiles come from.

use crate::{CoordinateTile, CoordsError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A provider of coordinate tiles addressed by hydrologic unit code.
///
/// Implementations may block on disk or network I/O. They are free to cache,
/// but callers that need a stable view within one operation should hold on to
/// the returned `Arc` rather than calling again.
pub trait CoordinateSource {
    /// Load the tile for a hydrologic unit.
    fn load_tile(&self, huc: &str) -> Result<Arc<CoordinateTile>>;
}

impl<T: CoordinateSource + ?Sized> CoordinateSource for &T {
    fn load_tile(&self, huc: &str) -> Result<Arc<CoordinateTile>> {
        (**self).load_tile(huc)
    }
}

impl<T: CoordinateSource + ?Sized> CoordinateSource for Arc<T> {
    fn load_tile(&self, huc: &str) -> Result<Arc<CoordinateTile>> {
        (**self).load_tile(huc)
    }
}

/// Tiles held in memory.
///
/// Counts every `load_tile` call so callers can check how often a tile was
/// requested.
#[derive(Debug, Default)]
pub struct InMemorySource {
    tiles: HashMap<String, Arc<CoordinateTile>>,
    loads: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile, replacing any tile with the same code.
    pub fn insert(&mut self, tile: CoordinateTile) {
        self.tiles.insert(tile.huc().to_string(), Arc::new(tile));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_tile(mut self, tile: CoordinateTile) -> Self {
        self.insert(tile);
        self
    }

    /// Number of `load_tile` calls served so far (including failed ones).
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl CoordinateSource for InMemorySource {
    fn load_tile(&self, huc: &str) -> Result<Arc<CoordinateTile>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.tiles
            .get(huc)
            .cloned()
            .ok_or_else(|| CoordsError::NoTileFound { huc: huc.to_string() })
    }
}
