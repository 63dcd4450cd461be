//! End-to-end reach extraction.

use crate::{
    fit_and_resample, stitch, walk, ExtractionConfig, FittedCurve, HucLevel, ReachChain, Result,
    SegmentCatalog, SegmentId, StitchedProfile,
};
use meander_coords::CoordinateSource;
use tracing::{info, warn};

/// All artifacts of one assembled reach.
#[derive(Debug, Clone)]
pub struct ReachExtraction {
    pub chain: ReachChain,
    pub profile: StitchedProfile,
    pub curve: FittedCurve,
}

/// Assembles reaches from a catalog and a coordinate source.
///
/// Holds only read-only state, so one extractor can serve many start
/// segments, including from several threads when `S` is `Sync`.
///
/// # Example
///
/// ```no_run
/// use meander_coords::CoordinateManager;
/// use meander_reach::{ExtractionConfig, ReachExtractor, SegmentCatalog, SegmentId};
///
/// let catalog = SegmentCatalog::from_csv_path("vaa.csv")?;
/// let mut coords = CoordinateManager::new();
/// coords.add_directory("coordinates")?;
///
/// let extractor = ReachExtractor::new(&catalog, coords, ExtractionConfig::default())?;
/// let curve = extractor.assemble_reach(SegmentId(5000100001234))?;
/// println!("{} resampled points, step {:.2}", curve.len(), curve.step);
/// # Ok::<(), meander_reach::ReachError>(())
/// ```
#[derive(Debug)]
pub struct ReachExtractor<'a, S> {
    catalog: &'a SegmentCatalog,
    source: S,
    config: ExtractionConfig,
}

impl<'a, S: CoordinateSource> ReachExtractor<'a, S> {
    /// Create an extractor, validating `config`.
    pub fn new(catalog: &'a SegmentCatalog, source: S, config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            source,
            config,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        self.catalog
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Segment chain starting at `start`.
    pub fn chain(&self, start: SegmentId) -> Result<ReachChain> {
        walk(self.catalog, start, self.config.hu_level, self.config.max_walk_len)
    }

    /// Stitched geometry of a chain.
    pub fn profile(&self, chain: &ReachChain) -> Result<StitchedProfile> {
        stitch(self.catalog, chain, &self.source, &self.config)
    }

    /// Resampled curve of a profile.
    pub fn fit(&self, profile: &StitchedProfile) -> Result<FittedCurve> {
        fit_and_resample(
            profile,
            self.config.min_fit_points,
            self.config.max_grid_points,
        )
    }

    /// Walk, stitch and fit, keeping every intermediate artifact.
    pub fn extract_reach(&self, start: SegmentId) -> Result<ReachExtraction> {
        let chain = self.chain(start)?;
        let profile = self.profile(&chain)?;
        let curve = self.fit(&profile)?;
        info!(
            start = %start,
            segments = chain.len(),
            points = profile.len(),
            resampled = curve.len(),
            "assembled reach"
        );
        Ok(ReachExtraction {
            chain,
            profile,
            curve,
        })
    }

    /// Walk, stitch and fit the reach starting at `start`.
    pub fn assemble_reach(&self, start: SegmentId) -> Result<FittedCurve> {
        self.extract_reach(start).map(|r| r.curve)
    }

    /// Extract the reach of every headwater segment in `unit`.
    ///
    /// `unit` is interpreted at the configured walk level. A failing reach is
    /// reported in its slot and does not stop the others.
    pub fn assemble_headwaters(&self, unit: &str) -> Vec<(SegmentId, Result<ReachExtraction>)> {
        let starts = self.catalog.headwaters(unit, self.config.hu_level);
        info!(
            unit,
            level = %self.config.hu_level,
            headwaters = starts.len(),
            "extracting headwater reaches"
        );

        starts
            .into_iter()
            .map(|start| {
                let result = self.extract_reach(start);
                if let Err(e) = &result {
                    warn!(start = %start, error = %e, "reach extraction failed");
                }
                (start, result)
            })
            .collect()
    }

    /// Units available for [`assemble_headwaters`](Self::assemble_headwaters).
    pub fn units(&self) -> Vec<String> {
        self.catalog.units(self.config.hu_level)
    }

    /// Walk level in use.
    pub fn hu_level(&self) -> HucLevel {
        self.config.hu_level
    }
}
