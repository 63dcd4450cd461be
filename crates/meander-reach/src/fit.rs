//! Spline fitting and uniform arc-length resampling of a stitched profile.

use crate::spline::{CubicSpline, LinearSpline, StepLookup, CUBIC_MIN_POINTS};
use crate::{ReachError, Result, SegmentId, StitchedProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tolerance on the grid point count so `s_max` survives rounding.
const GRID_EPSILON: f64 = 1e-9;

/// A reach resampled onto a uniform arc-length grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    /// Grid step.
    pub step: f64,
    pub s: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    /// Segment at or before each grid position.
    pub segment: Vec<SegmentId>,
}

impl FittedCurve {
    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// `(first, last)` grid position.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((*self.s.first()?, *self.s.last()?))
    }
}

/// Uniform grid from `s_min` in steps of `step`, up to and including `s_max`
/// when it lies on the grid.
///
/// Fails with [`ReachError::InvalidProfile`] before allocating when the grid
/// would hold more than `max_points` positions.
pub fn arc_length_grid(
    s_min: f64,
    s_max: f64,
    step: f64,
    max_points: usize,
) -> Result<Vec<f64>> {
    let count = ((s_max - s_min) / step + GRID_EPSILON).floor() + 1.0;
    if !(count.is_finite() && count >= 1.0 && count <= max_points as f64) {
        return Err(ReachError::InvalidProfile(format!(
            "grid step {:e} over [{}, {}] gives {:e} points, limit is {}",
            step, s_min, s_max, count, max_points
        )));
    }
    Ok((0..count as usize)
        .map(|i| (s_min + i as f64 * step).min(s_max))
        .collect())
}

/// Fit the profile and resample it.
///
/// The grid step is the smallest gap between consecutive profile positions.
/// x(s) and y(s) use cubic interpolating splines, z(s) a linear one, and the
/// segment label a step lookup. Fewer than `min_points` (and never fewer than
/// four) profile points fails with [`ReachError::InsufficientData`]; a grid
/// larger than `max_grid_points` fails with [`ReachError::InvalidProfile`].
pub fn fit_and_resample(
    profile: &StitchedProfile,
    min_points: usize,
    max_grid_points: usize,
) -> Result<FittedCurve> {
    let required = min_points.max(CUBIC_MIN_POINTS);
    if profile.len() < required {
        return Err(ReachError::InsufficientData {
            required,
            found: profile.len(),
        });
    }

    let s = profile.s();
    let step = s
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);
    if !(step.is_finite() && step > 0.0) {
        return Err(ReachError::InvalidProfile(format!("invalid grid step {}", step)));
    }

    let (s_min, s_max) = (s[0], s[s.len() - 1]);
    let grid = arc_length_grid(s_min, s_max, step, max_grid_points)?;

    let x_spline = CubicSpline::interpolate(&s, &profile.x())?;
    let y_spline = CubicSpline::interpolate(&s, &profile.y())?;
    let z_spline = LinearSpline::interpolate(&s, &profile.z())?;
    let segment_lookup = StepLookup::new(&s, &profile.segments())?;

    let x = sample(&grid, |t| x_spline.evaluate(t))?;
    let y = sample(&grid, |t| y_spline.evaluate(t))?;
    let z = sample(&grid, |t| z_spline.evaluate(t))?;
    let segment = grid.iter().map(|&t| segment_lookup.value_at(t)).collect();

    debug!(points = profile.len(), grid = grid.len(), step, "resampled profile");
    Ok(FittedCurve {
        step,
        s: grid,
        x,
        y,
        z,
        segment,
    })
}

fn sample(grid: &[f64], spline: impl Fn(f64) -> Option<f64>) -> Result<Vec<f64>> {
    grid.iter()
        .map(|&t| spline(t).ok_or(ReachError::OutOfRange { position: t }))
        .collect()
}
