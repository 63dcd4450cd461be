//! Integration tests for reach assembly across crates.
//!
//! Networks are synthetic: a sinuous river sampled along `y = 20 sin(x / 15)`
//! and cut into segments that share their endpoints.

use approx::assert_relative_eq;
use meander_coords::{
    tile_filename, CoordinateManager, CoordinateTile, InMemorySource, Point, Polyline,
};
use meander_reach::{
    fit_and_resample, stitch, walk, ExtractionConfig, HucCode, HucLevel, NetworkIssue, NodeId,
    ReachError, ReachExtractor, Segment, SegmentCatalog, SegmentId, StitchedProfile,
    DEFAULT_MAX_GRID_POINTS,
};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

fn river_point(x: f64) -> Point {
    Point::new(x, 20.0 * (x / 15.0).sin())
}

/// Vertices from `x0` to `x1` (inclusive) every `dx`.
fn river_line(x0: f64, x1: f64, dx: f64) -> Polyline {
    let n = ((x1 - x0) / dx).round() as usize;
    Polyline::new((0..=n).map(|i| river_point(x0 + i as f64 * dx)).collect())
}

fn segment(
    id: u64,
    from: u64,
    to: u64,
    huc: &str,
    slope: f64,
    order: u32,
    max_elev_cm: f64,
) -> Segment {
    Segment {
        id: SegmentId(id),
        from_node: NodeId(from),
        to_node: NodeId(to),
        huc: HucCode::new(huc).unwrap(),
        slope,
        stream_order: order,
        max_elevation: max_elev_cm,
        start_flag: false,
    }
}

/// Four segments in a chain; the last one lies in the neighbouring unit 0602.
/// A fifth, unrelated segment sits in 0601.
fn network() -> (SegmentCatalog, InMemorySource) {
    let catalog = SegmentCatalog::new(vec![
        segment(104, 4, 5, "06020001", 0.002, 3, 9_000.0),
        segment(101, 1, 2, "06010105", 0.010, 1, 12_000.0),
        segment(199, 9, 10, "06010105", 0.010, 1, 50_000.0),
        segment(102, 2, 3, "06010105", 0.005, 2, 11_000.0),
        segment(103, 3, 4, "06010106", 0.004, 2, 10_500.0),
    ])
    .unwrap();

    let mut west = HashMap::new();
    west.insert(SegmentId(101), river_line(0.0, 30.0, 3.0));
    west.insert(SegmentId(102), river_line(30.0, 60.0, 2.0));
    west.insert(SegmentId(103), river_line(60.0, 75.0, 5.0));
    west.insert(SegmentId(199), river_line(500.0, 520.0, 5.0));
    let mut east = HashMap::new();
    east.insert(SegmentId(104), river_line(75.0, 120.0, 4.5));

    let source = InMemorySource::new()
        .with_tile(CoordinateTile::new("0601", west))
        .with_tile(CoordinateTile::new("0602", east));
    (catalog, source)
}

fn basin_config() -> ExtractionConfig {
    ExtractionConfig {
        hu_level: HucLevel::HUC02,
        ..Default::default()
    }
}

fn ids(raw: &[u64]) -> Vec<SegmentId> {
    raw.iter().map(|&i| SegmentId(i)).collect()
}

// ============================================================================
// Walk
// ============================================================================

#[test]
fn test_walk_three_segment_chain() {
    let catalog = SegmentCatalog::new(vec![
        segment(1, 1, 2, "0601", 0.01, 1, 0.0),
        segment(2, 2, 3, "0601", 0.01, 1, 0.0),
        segment(3, 3, 4, "0601", 0.01, 1, 0.0),
        segment(4, 9, 10, "0601", 0.01, 1, 0.0),
    ])
    .unwrap();

    let chain = walk(&catalog, SegmentId(1), HucLevel::HUC04, None).unwrap();
    assert_eq!(chain.ids(), ids(&[1, 2, 3]).as_slice());
    assert!(!chain.ids().contains(&SegmentId(4)));
}

#[test]
fn test_walk_respects_level() {
    let (catalog, _) = network();

    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC08, None).unwrap();
    assert_eq!(chain.ids(), ids(&[101, 102]).as_slice());

    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC04, None).unwrap();
    assert_eq!(chain.ids(), ids(&[101, 102, 103]).as_slice());

    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC02, None).unwrap();
    assert_eq!(chain.ids(), ids(&[101, 102, 103, 104]).as_slice());
}

// ============================================================================
// Stitch
// ============================================================================

#[test]
fn test_stitch_loads_each_tile_once() {
    let (catalog, source) = network();
    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC02, None).unwrap();

    let profile = stitch(&catalog, &chain, &source, &basin_config()).unwrap();

    // Three segments in 0601, one in 0602
    assert_eq!(source.load_count(), 2);

    // 11 + 16 + 4 + 11 raw vertices, three shared endpoints
    assert_eq!(profile.len(), 11 + 16 + 4 + 11 - 3);
    assert_eq!(profile.spans().len(), 4);
}

#[test]
fn test_stitch_reuses_tile_when_chain_returns() {
    // 0601 -> 0602 -> 0601
    let catalog = SegmentCatalog::new(vec![
        segment(201, 1, 2, "06010105", 0.01, 1, 10_000.0),
        segment(202, 2, 3, "06020001", 0.01, 1, 10_000.0),
        segment(203, 3, 4, "06010106", 0.01, 1, 10_000.0),
    ])
    .unwrap();
    let mut west = HashMap::new();
    west.insert(SegmentId(201), river_line(0.0, 10.0, 5.0));
    west.insert(SegmentId(203), river_line(20.0, 30.0, 5.0));
    let mut east = HashMap::new();
    east.insert(SegmentId(202), river_line(10.0, 20.0, 5.0));
    let source = InMemorySource::new()
        .with_tile(CoordinateTile::new("0601", west))
        .with_tile(CoordinateTile::new("0602", east));

    let chain = walk(&catalog, SegmentId(201), HucLevel::HUC02, None).unwrap();
    assert_eq!(chain.ids(), ids(&[201, 202, 203]).as_slice());

    let profile = stitch(&catalog, &chain, &source, &basin_config()).unwrap();
    assert_eq!(source.load_count(), 2);
    assert_eq!(profile.len(), 3 + 3 + 3 - 2);
    assert_eq!(profile.points()[profile.len() - 1].segment, SegmentId(203));
}

#[test]
fn test_near_duplicate_endpoint_is_kept() {
    let catalog = SegmentCatalog::new(vec![
        segment(301, 1, 2, "06010105", 0.01, 1, 10_000.0),
        segment(302, 2, 3, "06010105", 0.01, 1, 10_000.0),
    ])
    .unwrap();
    let mut tile = HashMap::new();
    tile.insert(
        SegmentId(301),
        Polyline::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)]),
    );
    // Start differs from the previous end by rounding only
    tile.insert(
        SegmentId(302),
        Polyline::new(vec![
            Point::new(10.0 + 1e-12, 0.0),
            Point::new(15.0, 0.0),
            Point::new(20.0, 0.0),
        ]),
    );
    let source = InMemorySource::new().with_tile(CoordinateTile::new("0601", tile));

    let chain = walk(&catalog, SegmentId(301), HucLevel::HUC08, None).unwrap();
    let profile = stitch(&catalog, &chain, &source, &ExtractionConfig::default()).unwrap();
    assert_eq!(profile.len(), 6);
    assert!(profile.s().windows(2).all(|w| w[1] > w[0]));

    // The sub-nanometre gap would need a grid far beyond the limit
    let extractor = ReachExtractor::new(&catalog, &source, ExtractionConfig::default()).unwrap();
    assert!(matches!(
        extractor.assemble_reach(SegmentId(301)),
        Err(ReachError::InvalidProfile(_))
    ));
}

#[test]
fn test_shared_endpoint_removed_once() {
    let (catalog, source) = network();
    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC08, None).unwrap();
    let profile = stitch(&catalog, &chain, &source, &ExtractionConfig::default()).unwrap();

    assert_eq!(profile.len(), 11 + 16 - 1);

    // Boundary point belongs to the upstream segment
    let boundary = profile.points()[10];
    assert_eq!(boundary.segment, SegmentId(101));
    assert_relative_eq!(boundary.x, 30.0);
    assert_eq!(profile.points()[11].segment, SegmentId(102));
    assert_eq!(profile.points()[11].stream_order, 2);
}

#[test]
fn test_arc_length_strictly_increasing_from_zero() {
    let (catalog, source) = network();
    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC02, None).unwrap();
    let profile = stitch(&catalog, &chain, &source, &basin_config()).unwrap();

    let s = profile.s();
    assert_eq!(s[0], 0.0);
    assert!(s.windows(2).all(|w| w[1] > w[0]));

    // Arc length equals the summed polyline length
    let expected: f64 = [(0.0, 30.0, 3.0), (30.0, 60.0, 2.0), (60.0, 75.0, 5.0), (75.0, 120.0, 4.5)]
        .iter()
        .map(|&(a, b, d)| river_line(a, b, d).length())
        .sum();
    assert_relative_eq!(profile.length(), expected, max_relative = 1e-12);
}

#[test]
fn test_elevation_reconstruction() {
    let (catalog, source) = network();
    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC02, None).unwrap();
    let profile = stitch(&catalog, &chain, &source, &basin_config()).unwrap();
    let points = profile.points();

    // First segment anchored at its max elevation in meters
    assert_relative_eq!(points[0].z, 120.0);

    for span in profile.spans() {
        let slice = &points[span.start..=span.end];
        assert!(slice.windows(2).all(|w| w[1].z <= w[0].z), "span {:?} rises", span);

        let slope = catalog.lookup(span.segment).unwrap().slope;
        let drop = slice[0].z - slice[slice.len() - 1].z;
        let run = slice[slice.len() - 1].s - slice[0].s;
        assert_relative_eq!(drop, run * slope, max_relative = 1e-9);
    }

    // Later segments continue from the boundary instead of their own max elevation
    let boundary = points[profile.spans()[1].start];
    let first_length = river_line(0.0, 30.0, 3.0).length();
    assert_relative_eq!(boundary.z, 120.0 - first_length * 0.010, max_relative = 1e-12);
    assert!((boundary.z - 110.0).abs() > 1.0);
}

#[test]
fn test_missing_geometry_is_data_gap() {
    let (catalog, _) = network();
    let mut west = HashMap::new();
    west.insert(SegmentId(101), river_line(0.0, 30.0, 3.0));
    let source = InMemorySource::new().with_tile(CoordinateTile::new("0601", west));

    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC08, None).unwrap();
    let err = stitch(&catalog, &chain, &source, &ExtractionConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ReachError::DataGap { segment, ref huc } if segment == SegmentId(102) && huc == "0601"
    ));
}

#[test]
fn test_missing_tile_is_data_gap() {
    let (catalog, _) = network();
    let source = InMemorySource::new();

    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC08, None).unwrap();
    let err = stitch(&catalog, &chain, &source, &ExtractionConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ReachError::DataGap { segment, ref huc } if segment == SegmentId(101) && huc == "0601"
    ));
}

// ============================================================================
// Fit
// ============================================================================

#[test]
fn test_fit_grid_bounds_and_knots() {
    let (catalog, source) = network();
    let chain = walk(&catalog, SegmentId(101), HucLevel::HUC02, None).unwrap();
    let profile = stitch(&catalog, &chain, &source, &basin_config()).unwrap();
    let curve = fit_and_resample(&profile, 4, DEFAULT_MAX_GRID_POINTS).unwrap();

    let s = profile.s();
    let min_gap = s.windows(2).map(|w| w[1] - w[0]).fold(f64::INFINITY, f64::min);
    assert_relative_eq!(curve.step, min_gap);

    let (lo, hi) = curve.bounds().unwrap();
    assert_eq!(lo, 0.0);
    assert!(hi <= profile.length());
    assert!(profile.length() - hi < curve.step);

    // Grid is uniform
    assert!(curve.s.windows(2).all(|w| ((w[1] - w[0]) - curve.step).abs() < 1e-9));

    // Labels only name chain members and follow chain order
    let order: Vec<_> = curve
        .segment
        .iter()
        .map(|id| chain.ids().iter().position(|c| c == id).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(curve.segment[0], SegmentId(101));
}

#[test]
fn test_fit_reproduces_profile_at_knots() {
    let points: Vec<_> = (0..8)
        .map(|i| {
            let s = i as f64 * 2.0;
            meander_reach::ProfilePoint {
                s,
                x: 3.0 * s,
                y: (s * 0.4).cos() * 10.0,
                z: 50.0 - 0.1 * s,
                stream_order: 1,
                segment: SegmentId(1),
            }
        })
        .collect();
    let profile = StitchedProfile::from_points(points).unwrap();
    let curve = fit_and_resample(&profile, 4, DEFAULT_MAX_GRID_POINTS).unwrap();

    assert_eq!(curve.len(), profile.len());
    for (i, p) in profile.points().iter().enumerate() {
        assert_relative_eq!(curve.x[i], p.x, epsilon = 1e-9);
        assert_relative_eq!(curve.y[i], p.y, epsilon = 1e-9);
        assert_relative_eq!(curve.z[i], p.z, epsilon = 1e-9);
    }
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_assemble_reach_short_reach_is_insufficient() {
    let catalog = SegmentCatalog::new(vec![segment(1, 1, 2, "0601", 0.01, 1, 1000.0)]).unwrap();
    let mut tile = HashMap::new();
    tile.insert(
        SegmentId(1),
        Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 1.5)]),
    );
    let source = InMemorySource::new().with_tile(CoordinateTile::new("0601", tile));

    let extractor = ReachExtractor::new(&catalog, &source, ExtractionConfig::default()).unwrap();
    let err = extractor.assemble_reach(SegmentId(1)).unwrap_err();
    assert!(matches!(err, ReachError::InsufficientData { required: 4, found: 3 }));
}

#[test]
fn test_assemble_reach_reports_cycle() {
    let catalog = SegmentCatalog::new(vec![
        segment(1, 1, 2, "0601", 0.01, 1, 0.0),
        segment(2, 2, 1, "0601", 0.01, 1, 0.0),
    ])
    .unwrap();
    let source = InMemorySource::new();
    let extractor = ReachExtractor::new(&catalog, &source, ExtractionConfig::default()).unwrap();

    assert!(matches!(
        extractor.assemble_reach(SegmentId(1)),
        Err(ReachError::NetworkInconsistency { issue: NetworkIssue::Cycle { .. }, .. })
    ));
    // Nothing was loaded for a reach that failed during the walk
    assert_eq!(source.load_count(), 0);
}

#[test]
fn test_extractor_rejects_bad_config() {
    let (catalog, source) = network();
    let config = ExtractionConfig {
        min_fit_points: 2,
        ..Default::default()
    };
    assert!(matches!(
        ReachExtractor::new(&catalog, source, config),
        Err(ReachError::InvalidConfig(_))
    ));
}

#[test]
fn test_assemble_headwaters_isolates_failures() {
    let mut segments = vec![
        segment(1, 1, 2, "0601", 0.01, 1, 1000.0),
        segment(2, 2, 3, "0601", 0.01, 1, 1000.0),
        segment(7, 70, 71, "0601", 0.01, 1, 1000.0),
    ];
    segments[0].start_flag = true;
    segments[2].start_flag = true;
    let catalog = SegmentCatalog::new(segments).unwrap();

    let mut tile = HashMap::new();
    tile.insert(SegmentId(1), river_line(0.0, 10.0, 2.0));
    tile.insert(SegmentId(2), river_line(10.0, 20.0, 2.5));
    // Segment 7 has no geometry
    let source = InMemorySource::new().with_tile(CoordinateTile::new("0601", tile));

    let extractor = ReachExtractor::new(&catalog, &source, ExtractionConfig::default()).unwrap();
    let results = extractor.assemble_headwaters("0601");

    assert_eq!(results.len(), 2);
    let (first, ok) = &results[0];
    assert_eq!(*first, SegmentId(1));
    let extraction = ok.as_ref().unwrap();
    assert_eq!(extraction.chain.ids(), ids(&[1, 2]).as_slice());
    assert_eq!(extraction.profile.len(), 6 + 5 - 1);

    let (second, failed) = &results[1];
    assert_eq!(*second, SegmentId(7));
    assert!(matches!(failed, Err(ReachError::DataGap { .. })));
}

#[test]
fn test_assemble_from_files() {
    let dir = TempDir::new().unwrap();
    let (catalog, source) = network();
    for huc in ["0601", "0602"] {
        let tile = meander_coords::CoordinateSource::load_tile(&source, huc).unwrap();
        fs::write(dir.path().join(tile_filename(huc)), tile.to_json_string().unwrap()).unwrap();
    }

    let mut manager = CoordinateManager::new();
    assert_eq!(manager.add_directory(dir.path()).unwrap(), 2);

    let extractor = ReachExtractor::new(&catalog, manager, basin_config()).unwrap();
    let from_files = extractor.extract_reach(SegmentId(101)).unwrap();

    let in_memory = ReachExtractor::new(&catalog, &source, basin_config())
        .unwrap()
        .extract_reach(SegmentId(101))
        .unwrap();

    assert_eq!(from_files.chain, in_memory.chain);
    assert_eq!(from_files.profile, in_memory.profile);
    assert_eq!(from_files.curve, in_memory.curve);
    assert_eq!(extractor.source().loaded_tile_count(), 2);
}
