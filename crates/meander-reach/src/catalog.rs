//! In-memory index of river network segment attributes.

use crate::{HucCode, HucLevel, ReachError, Result, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Topology node of the network (NHDPlus `FromNode`/`ToNode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One directed edge of the stream network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Upstream node.
    pub from_node: NodeId,
    /// Downstream node.
    pub to_node: NodeId,
    /// Finest hydrologic unit code known for the segment.
    pub huc: HucCode,
    /// Rise over run, positive when draining downstream.
    pub slope: f64,
    /// Strahler stream order (>= 1).
    pub stream_order: u32,
    /// Smoothed maximum elevation in catalog units (centimeters for NHDPlus).
    pub max_elevation: f64,
    /// Marks a headwater segment.
    #[serde(default)]
    pub start_flag: bool,
}

impl Segment {
    /// False when slope or maximum elevation is negative, as with the
    /// NHDPlus no-data value -9998.
    pub fn has_valid_attributes(&self) -> bool {
        self.slope >= 0.0 && self.max_elevation >= 0.0
    }

    /// Unit code of this segment at `level`.
    pub fn unit(&self, level: HucLevel) -> Result<&str> {
        self.huc.at_level(level).ok_or(ReachError::UnitUnavailable {
            segment: self.id,
            level: level.digits(),
        })
    }
}

/// Read-only table of segments, indexed by identifier.
///
/// Iteration and filtering preserve the order segments were supplied in
/// ("catalog order").
#[derive(Debug, Clone, Default)]
pub struct SegmentCatalog {
    segments: Vec<Segment>,
    index: HashMap<SegmentId, usize>,
}

impl SegmentCatalog {
    /// Build a catalog, rejecting duplicate identifiers and zero stream orders.
    ///
    /// Segments with negative slope or elevation are kept with a warning.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        let mut index = HashMap::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            if !segment.has_valid_attributes() {
                warn!(
                    segment = %segment.id,
                    slope = segment.slope,
                    max_elevation = segment.max_elevation,
                    "segment has negative attributes"
                );
            }
            if segment.stream_order == 0 {
                return Err(ReachError::InvalidCatalog(format!(
                    "segment {} has stream order 0",
                    segment.id
                )));
            }
            if index.insert(segment.id, i).is_some() {
                return Err(ReachError::InvalidCatalog(format!(
                    "duplicate segment {}",
                    segment.id
                )));
            }
        }
        Ok(Self { segments, index })
    }

    /// Load an NHDPlus-style value-added attribute table from CSV.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_csv_reader(file)?;
        info!(path = %path.display(), segments = catalog.len(), "loaded segment catalog");
        Ok(catalog)
    }

    /// Load a value-added attribute table from any CSV reader.
    ///
    /// Recognized columns: `NHDPlusID` (or `COMID`), `FromNode`, `ToNode`,
    /// `HUC04`/`HUC08`/`HUC10`/`HUC12` (at least one; the finest present is
    /// kept and the others must be its prefixes), `Slope`, `StreamOrde`,
    /// `MaxElevSmo` and optionally `StartFlag`. Identifiers may be written as
    /// integral floats.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut segments = Vec::new();
        for record in csv_reader.deserialize::<VaaRecord>() {
            segments.push(record?.into_segment()?);
        }
        Self::new(segments)
    }

    /// Load a JSON array of [`Segment`] records.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let segments: Vec<Segment> = serde_json::from_str(&text)?;
        let catalog = Self::new(segments)?;
        info!(path = %path.display(), segments = catalog.len(), "loaded segment catalog");
        Ok(catalog)
    }

    /// Attributes of a segment.
    pub fn lookup(&self, id: SegmentId) -> Result<&Segment> {
        self.get(id).ok_or(ReachError::NotFound { segment: id })
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.index.get(&id).map(|&i| &self.segments[i])
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Segments inside hydrologic unit `unit` at `level`, in catalog order.
    pub fn filter_by_unit(&self, unit: &str, level: HucLevel) -> Vec<SegmentId> {
        self.in_unit(unit, level).map(|s| s.id).collect()
    }

    /// Distinct unit codes at `level`, sorted.
    pub fn units(&self, level: HucLevel) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|s| s.huc.at_level(level))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Headwater segments (start flag set) inside a unit, in catalog order.
    pub fn headwaters(&self, unit: &str, level: HucLevel) -> Vec<SegmentId> {
        self.in_unit(unit, level)
            .filter(|s| s.start_flag)
            .map(|s| s.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn in_unit<'a>(
        &'a self,
        unit: &'a str,
        level: HucLevel,
    ) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments
            .iter()
            .filter(move |s| s.huc.at_level(level) == Some(unit))
    }
}

/// One row of the value-added attribute table.
#[derive(Debug, Deserialize)]
struct VaaRecord {
    #[serde(rename = "NHDPlusID", alias = "COMID")]
    id: String,
    #[serde(rename = "FromNode")]
    from_node: String,
    #[serde(rename = "ToNode")]
    to_node: String,
    #[serde(rename = "HUC04", default)]
    huc04: Option<String>,
    #[serde(rename = "HUC08", default)]
    huc08: Option<String>,
    #[serde(rename = "HUC10", default)]
    huc10: Option<String>,
    #[serde(rename = "HUC12", default)]
    huc12: Option<String>,
    #[serde(rename = "Slope")]
    slope: f64,
    #[serde(rename = "StreamOrde")]
    stream_order: u32,
    #[serde(rename = "MaxElevSmo")]
    max_elevation: f64,
    #[serde(rename = "StartFlag", default)]
    start_flag: Option<u8>,
}

impl VaaRecord {
    fn into_segment(self) -> Result<Segment> {
        let id = SegmentId(parse_integral("NHDPlusID", &self.id)?);

        let codes: Vec<HucCode> = [self.huc04, self.huc08, self.huc10, self.huc12]
            .into_iter()
            .flatten()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .map(HucCode::new)
            .collect::<Result<_>>()?;
        let huc = codes
            .iter()
            .max_by_key(|c| c.level())
            .cloned()
            .ok_or_else(|| {
                ReachError::InvalidCatalog(format!("segment {} has no HUC column", id))
            })?;
        if let Some(bad) = codes.iter().find(|c| !huc.is_within(c)) {
            return Err(ReachError::InvalidCatalog(format!(
                "segment {}: unit {} does not contain {}",
                id, bad, huc
            )));
        }

        Ok(Segment {
            id,
            from_node: NodeId(parse_integral("FromNode", &self.from_node)?),
            to_node: NodeId(parse_integral("ToNode", &self.to_node)?),
            huc,
            slope: self.slope,
            stream_order: self.stream_order,
            max_elevation: self.max_elevation,
            start_flag: self.start_flag.unwrap_or(0) != 0,
        })
    }
}

/// Parse an identifier column that may hold `123` or `123.0`.
fn parse_integral(column: &str, value: &str) -> Result<u64> {
    SegmentId::parse_key(value)
        .map(|id| id.0)
        .ok_or_else(|| {
            ReachError::InvalidCatalog(format!("{} '{}' is not an identifier", column, value))
        })
}
