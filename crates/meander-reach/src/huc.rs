//! Hydrologic unit codes and granularity levels.
//!
//! Watershed boundary codes nest by prefix: the 4-digit unit `0601` contains
//! the 8-digit unit `06010105`, which contains the 12-digit unit
//! `060101050203`. A segment therefore stores its finest code and derives the
//! coarser ones.

use crate::{ReachError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in a hydrologic unit code (2, 4, ..., 16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HucLevel(u8);

impl HucLevel {
    pub const HUC02: HucLevel = HucLevel(2);
    pub const HUC04: HucLevel = HucLevel(4);
    pub const HUC06: HucLevel = HucLevel(6);
    pub const HUC08: HucLevel = HucLevel(8);
    pub const HUC10: HucLevel = HucLevel(10);
    pub const HUC12: HucLevel = HucLevel(12);

    /// Finest level accepted.
    pub const MAX_DIGITS: u8 = 16;

    /// Create a level from a digit count.
    pub fn new(digits: u8) -> Result<Self> {
        if digits == 0 || digits % 2 != 0 || digits > Self::MAX_DIGITS {
            return Err(ReachError::InvalidConfig(format!(
                "hydrologic unit level must be an even digit count in 2..={}, got {}",
                Self::MAX_DIGITS,
                digits
            )));
        }
        Ok(HucLevel(digits))
    }

    pub fn digits(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HucLevel {
    type Error = ReachError;

    fn try_from(digits: u8) -> Result<Self> {
        HucLevel::new(digits)
    }
}

impl From<HucLevel> for u8 {
    fn from(level: HucLevel) -> u8 {
        level.0
    }
}

impl fmt::Display for HucLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HUC{:02}", self.0)
    }
}

/// A validated hydrologic unit code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HucCode(String);

impl HucCode {
    /// Validate a code: an even number of ASCII digits, at most 16.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let valid = !code.is_empty()
            && code.len() % 2 == 0
            && code.len() <= HucLevel::MAX_DIGITS as usize
            && code.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(ReachError::InvalidCatalog(format!(
                "'{}' is not a hydrologic unit code",
                code
            )));
        }
        Ok(HucCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Granularity of this code.
    pub fn level(&self) -> HucLevel {
        HucLevel(self.0.len() as u8)
    }

    /// The enclosing unit code at a coarser (or equal) level.
    ///
    /// Returns `None` when the requested level is finer than this code.
    pub fn at_level(&self, level: HucLevel) -> Option<&str> {
        self.0.get(..level.digits() as usize)
    }

    /// Whether this unit lies inside `other`.
    pub fn is_within(&self, other: &HucCode) -> bool {
        self.0.starts_with(other.as_str())
    }
}

impl TryFrom<String> for HucCode {
    type Error = ReachError;

    fn try_from(code: String) -> Result<Self> {
        HucCode::new(code)
    }
}

impl From<HucCode> for String {
    fn from(code: HucCode) -> String {
        code.0
    }
}

impl fmt::Display for HucCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
