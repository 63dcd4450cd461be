//! Cross-tile coordinate stitching and elevation reconstruction.
//!
//! Segment polylines are concatenated in chain order into one sequence
//! indexed by cumulative arc length. Consecutive segments share an endpoint,
//! so a point identical to the previously retained one is dropped. This also
//! removes zero-length steps inside a segment, which keeps `s` strictly
//! increasing.
//!
//! Elevation is not measured along the line. The first segment starts at its
//! catalog max elevation and every segment drains linearly with arc length at
//! its own slope, starting from the elevation already reached at the boundary
//! with the previous segment.

use crate::{ExtractionConfig, ReachChain, ReachError, Result, SegmentCatalog, SegmentId};
use meander_coords::{CoordinateSource, CoordinateTile, CoordsError, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One retained vertex of the stitched reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Arc length from the first retained point.
    pub s: f64,
    pub x: f64,
    pub y: f64,
    /// Reconstructed elevation in working units.
    pub z: f64,
    pub stream_order: u32,
    /// Segment the vertex came from. Shared endpoints belong to the upstream segment.
    pub segment: SegmentId,
}

/// Index range of the profile over which one segment's slope was applied.
///
/// `start` is the boundary point shared with the previous segment (or 0 for
/// the first segment); `end` is the last point the segment contributed.
/// A segment that contributed no new point has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub segment: SegmentId,
    pub start: usize,
    pub end: usize,
}

/// Deduplicated, arc-length indexed, elevation annotated reach geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StitchedProfile {
    points: Vec<ProfilePoint>,
    spans: Vec<SegmentSpan>,
}

impl StitchedProfile {
    /// Build a profile from points, checking that `s` is finite and strictly
    /// increasing. Spans are derived from runs of equal segment ids.
    pub fn from_points(points: Vec<ProfilePoint>) -> Result<Self> {
        let non_finite = points
            .iter()
            .find(|p| !(p.s.is_finite() && p.x.is_finite() && p.y.is_finite() && p.z.is_finite()));
        if let Some(p) = non_finite {
            return Err(ReachError::InvalidProfile(format!(
                "non-finite value at s = {} (segment {})",
                p.s, p.segment
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].s <= w[0].s) {
            return Err(ReachError::InvalidProfile(format!(
                "arc length not strictly increasing: {} then {}",
                w[0].s, w[1].s
            )));
        }

        let mut spans: Vec<SegmentSpan> = Vec::new();
        for (i, p) in points.iter().enumerate() {
            match spans.last_mut() {
                Some(span) if span.segment == p.segment => span.end = i,
                Some(_) => spans.push(SegmentSpan {
                    segment: p.segment,
                    start: i - 1,
                    end: i,
                }),
                None => spans.push(SegmentSpan {
                    segment: p.segment,
                    start: i,
                    end: i,
                }),
            }
        }

        Ok(Self { points, spans })
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    pub fn spans(&self) -> &[SegmentSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn s(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.s).collect()
    }

    pub fn x(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn z(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.z).collect()
    }

    pub fn segments(&self) -> Vec<SegmentId> {
        self.points.iter().map(|p| p.segment).collect()
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.s)
    }
}

/// Stitch the geometry of `chain` into one profile.
///
/// Each distinct coordinate tile touched by the chain is requested from
/// `source` exactly once, in the order the chain first reaches it.
pub fn stitch<S>(
    catalog: &SegmentCatalog,
    chain: &ReachChain,
    source: &S,
    config: &ExtractionConfig,
) -> Result<StitchedProfile>
where
    S: CoordinateSource + ?Sized,
{
    let segments = chain
        .iter()
        .map(|id| catalog.lookup(id))
        .collect::<Result<Vec<_>>>()?;

    // Memo of tiles for this call only
    let mut tiles: HashMap<&str, Arc<CoordinateTile>> = HashMap::new();
    let mut units = Vec::with_capacity(segments.len());
    for segment in &segments {
        let unit = segment.unit(config.tile_level)?;
        if !tiles.contains_key(unit) {
            let tile = source.load_tile(unit).map_err(|e| match e {
                CoordsError::NoTileFound { huc } => ReachError::DataGap {
                    segment: segment.id,
                    huc,
                },
                other => ReachError::Coords(other),
            })?;
            debug!(huc = unit, segments = tile.len(), "loaded tile for stitching");
            tiles.insert(unit, tile);
        }
        units.push(unit);
    }

    let mut points: Vec<ProfilePoint> = Vec::new();
    let mut spans = Vec::with_capacity(segments.len());
    let mut last: Option<Point> = None;

    for (segment, unit) in segments.iter().zip(&units) {
        let line = tiles
            .get(unit)
            .and_then(|tile| tile.get(segment.id))
            .filter(|line| !line.is_empty())
            .ok_or_else(|| ReachError::DataGap {
                segment: segment.id,
                huc: unit.to_string(),
            })?;

        let start = points.len().saturating_sub(1);
        for &p in line.points() {
            if last == Some(p) {
                continue;
            }
            let s = match (last, points.last()) {
                (Some(prev), Some(prev_point)) => prev_point.s + prev.distance(&p),
                _ => 0.0,
            };
            points.push(ProfilePoint {
                s,
                x: p.x,
                y: p.y,
                z: 0.0,
                stream_order: segment.stream_order,
                segment: segment.id,
            });
            last = Some(p);
        }
        let end = points.len() - 1;
        if end == start && !spans.is_empty() {
            warn!(segment = %segment.id, "segment added no new vertices");
        }
        spans.push(SegmentSpan {
            segment: segment.id,
            start,
            end,
        });
    }

    let first = segments
        .first()
        .ok_or_else(|| ReachError::InvalidProfile("empty reach chain".to_string()))?;
    let slopes: Vec<f64> = segments.iter().map(|s| s.slope).collect();
    reconstruct_elevation(
        &mut points,
        &spans,
        &slopes,
        first.max_elevation / config.elevation_divisor,
    );

    let profile = StitchedProfile { points, spans };
    info!(
        start = %first.id,
        segments = chain.len(),
        tiles = tiles.len(),
        points = profile.len(),
        length = profile.length(),
        "stitched reach"
    );
    Ok(profile)
}

/// Fill in elevation along the stitched points.
///
/// Segment 0 starts at `z_start`; segment k > 0 starts at the elevation of
/// its span's first point, which segment k - 1 already set. Within a span
/// `z = z0 - (s - s0) * slope`.
fn reconstruct_elevation(
    points: &mut [ProfilePoint],
    spans: &[SegmentSpan],
    slopes: &[f64],
    z_start: f64,
) {
    for (k, (span, &slope)) in spans.iter().zip(slopes).enumerate() {
        let s0 = points[span.start].s;
        let z0 = if k == 0 { z_start } else { points[span.start].z };
        for p in &mut points[span.start..=span.end] {
            p.z = z0 - (p.s - s0) * slope;
        }
    }
}
