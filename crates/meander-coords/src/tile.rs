//! Single coordinate tile representation.

use crate::{CoordsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Identifier of one river network segment (NHDPlus `COMID`/`NHDPlusID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SegmentId {
    /// Parse a tile key. Keys are written either as integers or as floats
    /// with an integral value (`"5000100001234.0"`).
    pub fn parse_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Ok(id) = key.parse::<u64>() {
            return Some(SegmentId(id));
        }
        let value: f64 = key.parse().ok()?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
            Some(SegmentId(value as u64))
        } else {
            None
        }
    }
}

/// A point in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Ordered vertices of one segment, upstream to downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a polyline from separate x and y arrays.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Option<Self> {
        if x.len() != y.len() {
            return None;
        }
        Some(Self {
            points: x.iter().zip(y).map(|(&x, &y)| Point::new(x, y)).collect(),
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length of the polyline.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// All segment polylines of one hydrologic unit.
///
/// On disk a tile is a JSON object keyed by segment id whose values are
/// `[[x0, x1, ...], [y0, y1, ...]]`.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTile {
    /// Hydrologic unit code that addresses this tile.
    huc: String,
    /// Polylines indexed by segment.
    polylines: HashMap<SegmentId, Polyline>,
}

impl CoordinateTile {
    /// Create a tile from already decoded polylines.
    pub fn new(huc: impl Into<String>, polylines: HashMap<SegmentId, Polyline>) -> Self {
        Self {
            huc: huc.into(),
            polylines,
        }
    }

    /// Load a tile from a JSON file.
    pub fn from_file<P: AsRef<Path>>(huc: impl Into<String>, path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(huc, &text)
    }

    /// Decode a tile from its JSON text.
    pub fn from_json_str(huc: impl Into<String>, text: &str) -> Result<Self> {
        let raw: HashMap<String, [Vec<f64>; 2]> = serde_json::from_str(text)?;
        let mut polylines = HashMap::with_capacity(raw.len());

        for (key, [x, y]) in raw {
            let id = SegmentId::parse_key(&key).ok_or_else(|| CoordsError::MalformedPolyline {
                segment: key.clone(),
                reason: "key is not a segment id".to_string(),
            })?;
            let polyline = Polyline::from_xy(&x, &y).ok_or_else(|| CoordsError::MalformedPolyline {
                segment: key.clone(),
                reason: format!("x has {} values but y has {}", x.len(), y.len()),
            })?;
            polylines.insert(id, polyline);
        }

        Ok(Self {
            huc: huc.into(),
            polylines,
        })
    }

    /// Encode the tile in the on-disk JSON layout.
    pub fn to_json_string(&self) -> Result<String> {
        let raw: HashMap<String, [Vec<f64>; 2]> = self
            .polylines
            .iter()
            .map(|(id, line)| {
                let x = line.points().iter().map(|p| p.x).collect();
                let y = line.points().iter().map(|p| p.y).collect();
                (id.to_string(), [x, y])
            })
            .collect();
        Ok(serde_json::to_string(&raw)?)
    }

    /// Hydrologic unit code of this tile.
    pub fn huc(&self) -> &str {
        &self.huc
    }

    /// Polyline of a segment, if the tile carries it.
    pub fn get(&self, id: SegmentId) -> Option<&Polyline> {
        self.polylines.get(&id)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.polylines.contains_key(&id)
    }

    /// Number of segments in the tile.
    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Segment ids carried by the tile, sorted.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        let mut ids: Vec<_> = self.polylines.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
