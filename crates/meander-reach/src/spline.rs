//! Interpolating splines over strictly increasing knots.
//!
//! None of these extrapolate: [`CubicSpline::evaluate`] and
//! [`LinearSpline::evaluate`] return `None` outside `[first knot, last knot]`.
//! [`StepLookup`] is the exception and extends its first and last values
//! flat.

use crate::{ReachError, Result};

/// Minimum points for a cubic interpolant.
pub const CUBIC_MIN_POINTS: usize = 4;

/// Minimum points for a linear interpolant.
pub const LINEAR_MIN_POINTS: usize = 2;

fn check_knots(knots: &[f64], values_len: usize, required: usize) -> Result<()> {
    if knots.len() != values_len {
        return Err(ReachError::InvalidProfile(format!(
            "{} knots but {} values",
            knots.len(),
            values_len
        )));
    }
    if knots.len() < required {
        return Err(ReachError::InsufficientData {
            required,
            found: knots.len(),
        });
    }
    if knots.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(ReachError::InvalidProfile(
            "knots must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Index `i` of the interval `[knots[i], knots[i + 1]]` containing `t`, or
/// `None` outside the knot range.
fn interval(knots: &[f64], t: f64) -> Option<usize> {
    let (first, last) = (*knots.first()?, *knots.last()?);
    if !(t >= first && t <= last) {
        return None;
    }
    let i = knots.partition_point(|&k| k <= t);
    Some(i.saturating_sub(1).min(knots.len() - 2))
}

/// Cubic interpolating spline with not-a-knot end conditions.
///
/// This is the zero-smoothing cubic spline: it passes through every data
/// point, and the third derivative is continuous across the second and the
/// second-to-last knot. Four points define a single cubic.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    /// Second derivative at each knot.
    moments: Vec<f64>,
}

impl CubicSpline {
    /// Fit through `(knots[i], values[i])`.
    pub fn interpolate(knots: &[f64], values: &[f64]) -> Result<Self> {
        check_knots(knots, values.len(), CUBIC_MIN_POINTS)?;

        let n = knots.len();
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let d: Vec<f64> = values
            .windows(2)
            .zip(&h)
            .map(|(w, &h)| (w[1] - w[0]) / h)
            .collect();

        // Unknowns are the interior moments M[1..n-1]; the end moments are
        // eliminated through the not-a-knot conditions.
        let m = n - 2;
        let mut sub = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut sup = vec![0.0; m];
        let mut rhs = vec![0.0; m];
        for j in 0..m {
            let i = j + 1;
            sub[j] = h[i - 1];
            diag[j] = 2.0 * (h[i - 1] + h[i]);
            sup[j] = h[i];
            rhs[j] = 6.0 * (d[i] - d[i - 1]);
        }

        let (h0, h1) = (h[0], h[1]);
        diag[0] += h0 * (h0 + h1) / h1;
        sup[0] -= h0 * h0 / h1;

        let (a, b) = (h[n - 3], h[n - 2]);
        diag[m - 1] += b * (a + b) / a;
        sub[m - 1] -= b * b / a;

        let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs);

        let mut moments = Vec::with_capacity(n);
        moments.push(((h0 + h1) * interior[0] - h0 * interior[1]) / h1);
        moments.extend_from_slice(&interior);
        moments.push(((a + b) * interior[m - 1] - b * interior[m - 2]) / a);

        Ok(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            moments,
        })
    }

    /// Value at `t`, or `None` outside the data range.
    pub fn evaluate(&self, t: f64) -> Option<f64> {
        let i = interval(&self.knots, t)?;
        let h = self.knots[i + 1] - self.knots[i];
        let a = (self.knots[i + 1] - t) / h;
        let b = (t - self.knots[i]) / h;
        let curvature = (a * a * a - a) * self.moments[i] + (b * b * b - b) * self.moments[i + 1];
        Some(a * self.values[i] + b * self.values[i + 1] + curvature * h * h / 6.0)
    }

    /// `(first knot, last knot)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }
}

/// Thomas algorithm. Assumes a diagonally dominant system.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i] * c[i - 1];
        c[i] = sup[i] / denom;
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    x
}

/// Piecewise linear interpolant (degree-1 zero-smoothing spline).
#[derive(Debug, Clone)]
pub struct LinearSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
}

impl LinearSpline {
    pub fn interpolate(knots: &[f64], values: &[f64]) -> Result<Self> {
        check_knots(knots, values.len(), LINEAR_MIN_POINTS)?;
        Ok(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
        })
    }

    /// Value at `t`, or `None` outside the data range.
    pub fn evaluate(&self, t: f64) -> Option<f64> {
        let i = interval(&self.knots, t)?;
        let w = (t - self.knots[i]) / (self.knots[i + 1] - self.knots[i]);
        Some(self.values[i] + w * (self.values[i + 1] - self.values[i]))
    }
}

/// Step function returning the value at or before the query point.
///
/// Queries before the first knot return the first value and queries after the
/// last knot return the last value, so lookups never fail.
#[derive(Debug, Clone)]
pub struct StepLookup<T> {
    knots: Vec<f64>,
    values: Vec<T>,
}

impl<T: Copy> StepLookup<T> {
    pub fn new(knots: &[f64], values: &[T]) -> Result<Self> {
        check_knots(knots, values.len(), 1)?;
        Ok(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
        })
    }

    pub fn value_at(&self, t: f64) -> T {
        let i = self.knots.partition_point(|&k| k <= t);
        self.values[i.saturating_sub(1)]
    }
}
