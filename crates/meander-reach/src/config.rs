//! Reach extraction settings.

use crate::spline::CUBIC_MIN_POINTS;
use crate::{HucLevel, ReachError, Result};
use serde::{Deserialize, Serialize};

/// Centimeters per meter; NHDPlus stores `MaxElevSmo` in centimeters.
pub const DEFAULT_ELEVATION_DIVISOR: f64 = 100.0;

/// Upper bound on resampled points per reach.
pub const DEFAULT_MAX_GRID_POINTS: usize = 1_000_000;

/// Settings for one [`ReachExtractor`](crate::ReachExtractor).
///
/// Every field has a default, so a YAML section only needs to name what it
/// changes. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Unit granularity the network walk is restricted to.
    pub hu_level: HucLevel,
    /// Unit granularity that addresses coordinate tiles.
    pub tile_level: HucLevel,
    /// Minimum distinct profile points before fitting.
    pub min_fit_points: usize,
    /// Divides catalog max elevation into working units.
    pub elevation_divisor: f64,
    /// Hard bound on chain length, in addition to revisit detection.
    pub max_walk_len: Option<usize>,
    /// Largest resampling grid a reach may produce.
    pub max_grid_points: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            hu_level: HucLevel::HUC04,
            tile_level: HucLevel::HUC04,
            min_fit_points: CUBIC_MIN_POINTS,
            elevation_divisor: DEFAULT_ELEVATION_DIVISOR,
            max_walk_len: None,
            max_grid_points: DEFAULT_MAX_GRID_POINTS,
        }
    }
}

impl ExtractionConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_fit_points < CUBIC_MIN_POINTS {
            return Err(ReachError::InvalidConfig(format!(
                "min_fit_points must be at least {}, got {}",
                CUBIC_MIN_POINTS, self.min_fit_points
            )));
        }
        if !(self.elevation_divisor.is_finite() && self.elevation_divisor > 0.0) {
            return Err(ReachError::InvalidConfig(format!(
                "elevation_divisor must be positive, got {}",
                self.elevation_divisor
            )));
        }
        if self.max_walk_len == Some(0) {
            return Err(ReachError::InvalidConfig(
                "max_walk_len must be at least 1".to_string(),
            ));
        }
        if self.max_grid_points < 2 {
            return Err(ReachError::InvalidConfig(format!(
                "max_grid_points must be at least 2, got {}",
                self.max_grid_points
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hu_level, HucLevel::HUC04);
        assert_eq!(config.min_fit_points, 4);
        assert_eq!(config.max_grid_points, DEFAULT_MAX_GRID_POINTS);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = ExtractionConfig {
            min_fit_points: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReachError::InvalidConfig(_))));

        let config = ExtractionConfig {
            elevation_divisor: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractionConfig {
            max_walk_len: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractionConfig {
            max_grid_points: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReachError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExtractionConfig = serde_json::from_str(r#"{"hu_level": 8}"#).unwrap();
        assert_eq!(config.hu_level, HucLevel::HUC08);
        assert_eq!(config.tile_level, HucLevel::HUC04);

        assert!(serde_json::from_str::<ExtractionConfig>(r#"{"save_format": "csv"}"#).is_err());
    }
}
