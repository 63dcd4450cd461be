//! Coordinate tile manager for a directory of per-HUC tiles with lazy loading.

use crate::{CoordinateSource, CoordinateTile, CoordsError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// File name suffix of coordinate tiles.
pub const TILE_SUFFIX: &str = "_coordinates.json";

/// Tile key: the hydrologic unit code a tile file covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TileKey(String);

impl TileKey {
    /// Parse a tile filename like `HUC04_0601_coordinates.json`.
    ///
    /// The two digits after `HUC` give the code length and must match the
    /// code that follows.
    fn from_filename(filename: &str) -> Option<Self> {
        let rest = filename.strip_prefix("HUC")?;
        let rest = rest.strip_suffix(TILE_SUFFIX)?;
        let (level, code) = rest.split_once('_')?;

        if level.len() != 2 || !level.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let level: usize = level.parse().ok()?;
        if code.len() != level || !code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some(TileKey(code.to_string()))
    }
}

/// Build the canonical file name for a tile.
pub fn tile_filename(huc: &str) -> String {
    format!("HUC{:02}_{}{}", huc.len(), huc, TILE_SUFFIX)
}

/// Manager for a directory of coordinate tiles with lazy loading.
///
/// The `CoordinateManager` indexes available tiles by scanning file names, and
/// only decodes a tile when it is first requested. Decoded tiles are kept in a
/// bounded LRU cache and handed out as shared `Arc`s.
///
/// This type is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use meander_coords::{CoordinateManager, CoordinateSource, SegmentId};
///
/// let mut manager = CoordinateManager::new();
/// manager.add_directory("coordinates")?;
///
/// let tile = manager.load_tile("0601")?;
/// if let Some(line) = tile.get(SegmentId(5000100001234)) {
///     println!("{} vertices", line.len());
/// }
/// # Ok::<(), meander_coords::CoordsError>(())
/// ```
#[derive(Debug)]
pub struct CoordinateManager {
    /// Available tile files indexed by unit code.
    tile_paths: HashMap<TileKey, PathBuf>,
    /// Cache of loaded tiles.
    cache: RwLock<TileCache>,
    /// Maximum number of tiles to keep in cache.
    max_cache_size: usize,
}

/// LRU cache for loaded tiles.
#[derive(Debug)]
struct TileCache {
    tiles: HashMap<TileKey, Arc<CoordinateTile>>,
    /// Access order for LRU eviction (most recently used at the back).
    access_order: Vec<TileKey>,
}

impl TileCache {
    fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            access_order: Vec::new(),
        }
    }

    fn get(&self, key: &TileKey) -> Option<Arc<CoordinateTile>> {
        self.tiles.get(key).cloned()
    }

    fn touch(&mut self, key: &TileKey) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            let key = self.access_order.remove(pos);
            self.access_order.push(key);
        }
    }

    fn insert(&mut self, key: TileKey, tile: Arc<CoordinateTile>, max_size: usize) {
        if self.tiles.contains_key(&key) {
            self.touch(&key);
            return;
        }

        while self.tiles.len() >= max_size.max(1) && !self.access_order.is_empty() {
            let oldest = self.access_order.remove(0);
            debug!(huc = %oldest.0, "evicting coordinate tile");
            self.tiles.remove(&oldest);
        }

        self.tiles.insert(key.clone(), tile);
        self.access_order.push(key);
    }

    fn len(&self) -> usize {
        self.tiles.len()
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.access_order.clear();
    }
}

impl Default for CoordinateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Default maximum number of tiles to cache.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 16;

impl CoordinateManager {
    /// Create a new empty manager with default cache size.
    pub fn new() -> Self {
        Self::with_cache_size(DEFAULT_MAX_CACHE_SIZE)
    }

    /// Create a new empty manager with a specified cache size.
    pub fn with_cache_size(max_cache_size: usize) -> Self {
        Self {
            tile_paths: HashMap::new(),
            cache: RwLock::new(TileCache::new()),
            max_cache_size,
        }
    }

    /// Add all tile files from a directory to the index.
    ///
    /// Only file names are inspected. Files that do not follow the
    /// `HUC{nn}_{code}_coordinates.json` convention are skipped.
    ///
    /// Returns the number of tiles indexed.
    pub fn add_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let mut count = 0;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if let Some(filename) = path.file_name().and_then(|s| s.to_str()) {
                if let Some(key) = TileKey::from_filename(filename) {
                    self.tile_paths.insert(key, path);
                    count += 1;
                }
            }
        }

        debug!(dir = %dir.display(), count, "indexed coordinate tiles");
        Ok(count)
    }

    /// Add a single tile file to the index.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CoordsError::InvalidFilename(path.display().to_string()))?;

        let key = TileKey::from_filename(filename)
            .ok_or_else(|| CoordsError::InvalidFilename(filename.to_string()))?;

        self.tile_paths.insert(key, path.to_path_buf());
        Ok(())
    }

    /// Check if a tile is indexed for the given unit.
    pub fn has_tile(&self, huc: &str) -> bool {
        self.tile_paths.contains_key(&TileKey(huc.to_string()))
    }

    /// Check if a tile is currently decoded in memory.
    pub fn is_tile_loaded(&self, huc: &str) -> bool {
        let key = TileKey(huc.to_string());
        self.cache.read().map(|c| c.get(&key).is_some()).unwrap_or(false)
    }

    /// Number of indexed tiles.
    pub fn tile_count(&self) -> usize {
        self.tile_paths.len()
    }

    /// Number of tiles currently in memory.
    pub fn loaded_tile_count(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Indexed unit codes, sorted.
    pub fn units(&self) -> Vec<String> {
        let mut units: Vec<_> = self.tile_paths.keys().map(|k| k.0.clone()).collect();
        units.sort();
        units
    }

    /// Drop all decoded tiles. They stay indexed and reload on demand.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

impl CoordinateSource for CoordinateManager {
    fn load_tile(&self, huc: &str) -> Result<Arc<CoordinateTile>> {
        let key = TileKey(huc.to_string());

        {
            let mut cache = self.cache.write().map_err(|_| CoordsError::CacheLockPoisoned)?;
            if let Some(tile) = cache.get(&key) {
                cache.touch(&key);
                return Ok(tile);
            }
        }

        let path = self
            .tile_paths
            .get(&key)
            .ok_or_else(|| CoordsError::NoTileFound { huc: huc.to_string() })?;

        debug!(huc, path = %path.display(), "loading coordinate tile");
        let tile = Arc::new(CoordinateTile::from_file(huc, path)?);

        let mut cache = self.cache.write().map_err(|_| CoordsError::CacheLockPoisoned)?;
        cache.insert(key, Arc::clone(&tile), self.max_cache_size);

        Ok(tile)
    }
}
