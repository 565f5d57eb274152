//! Band label parsing
//!
//! 거리구간 라벨 → 숫자 구간 (미터): '2km~3km', '500m~1km', '0~500m', '1km~1.5km'
//!
//! `km` suffix means ×1000, `m` or no unit means meters.

use crate::error::{GridError, Result};

/// Numeric interval of a band label, in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRange {
    pub lo: f64,
    pub hi: f64,
}

impl BandRange {
    pub fn parse(label: &str) -> Result<Self> {
        let malformed = || GridError::MalformedBandLabel {
            label: label.to_string(),
        };

        let (a, b) = label.trim().split_once('~').ok_or_else(malformed)?;
        let lo = to_meters(a).ok_or_else(malformed)?;
        let hi = to_meters(b).ok_or_else(malformed)?;
        if hi < lo {
            return Err(malformed());
        }
        Ok(Self { lo, hi })
    }

    /// Stand-in for the unknown true distance
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }
}

fn to_meters(part: &str) -> Option<f64> {
    let part = part.trim();
    let (number, scale) = if let Some(n) = part.strip_suffix("km") {
        (n, 1000.0)
    } else if let Some(n) = part.strip_suffix('m') {
        (n, 1.0)
    } else {
        (part, 1.0)
    };
    let value: f64 = number.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value * scale)
}

/// Parse a label and return its midpoint in meters.
pub fn band_midpoint(label: &str) -> Result<f64> {
    BandRange::parse(label).map(|r| r.midpoint())
}
