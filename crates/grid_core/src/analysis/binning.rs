//! Distance Binner
//!
//! 사이트 기준 거리 계산 + 500m 구간 라벨링.
//!
//! - distance > max_dist → dropped
//! - band index = floor(distance / bin_width) (a cell on a boundary goes to the higher band)
//! - distance == max_dist → kept

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GridError, Result};
use crate::grid::GridCell;
use crate::reference::ReferencePoint;

/// Binning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Band width in meters (기본: 500)
    pub bin_width: f64,
    /// Maximum analysis radius in meters, inclusive (기본: 10000)
    pub max_dist: f64,
    /// Gradation ring radii for summaries (기본: 1/3/5/10km)
    pub gradation_radii: Vec<f64>,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            bin_width: 500.0,
            max_dist: 10_000.0,
            gradation_radii: vec![1_000.0, 3_000.0, 5_000.0, 10_000.0],
        }
    }
}

impl BinningConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.bin_width > 0.0 && self.bin_width.is_finite()) {
            return Err(GridError::InvalidConfig(format!(
                "binning.bin_width must be positive, got {}",
                self.bin_width
            )));
        }
        if !(self.max_dist > 0.0 && self.max_dist.is_finite()) {
            return Err(GridError::InvalidConfig(format!(
                "binning.max_dist must be positive, got {}",
                self.max_dist
            )));
        }
        if self.gradation_radii.windows(2).any(|w| w[1] <= w[0])
            || self.gradation_radii.iter().any(|r| !(*r > 0.0))
        {
            return Err(GridError::InvalidConfig(
                "binning.gradation_radii must be positive and strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of bands tiling [0, max_dist)
    pub fn band_count(&self) -> u32 {
        (self.max_dist / self.bin_width).ceil() as u32
    }
}

/// Half-open distance band `[lo, hi)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    pub index: u32,
    pub lo: f64,
    pub hi: f64,
    pub label: String,
}

impl DistanceBand {
    pub fn from_index(index: u32, bin_width: f64) -> Self {
        let lo = index as f64 * bin_width;
        let hi = (index as f64 + 1.0) * bin_width;
        Self {
            index,
            lo,
            hi,
            label: format!("{}~{}", format_meters(lo), format_meters(hi)),
        }
    }

    pub fn for_distance(distance: f64, bin_width: f64) -> Self {
        Self::from_index((distance / bin_width).floor() as u32, bin_width)
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.lo && distance < self.hi
    }
}

/// Whole meters print without a fractional part ("500", not "500.0").
pub fn format_meters(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Cell annotated for one reference point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandedCell {
    pub cell: GridCell,
    pub reference_id: String,
    pub distance: f64,
    pub band: DistanceBand,
    pub is_masked: bool,
}

/// Distances + bands for one reference point; cells beyond `max_dist` are dropped.
///
/// A non-positive or non-finite `bin_width` yields no cells.
pub fn bin(
    cells: &[GridCell],
    reference: &ReferencePoint,
    bin_width: f64,
    max_dist: f64,
) -> Vec<BandedCell> {
    if !(bin_width > 0.0 && bin_width.is_finite()) {
        warn!("[bin] invalid bin width {}, no cells binned", bin_width);
        return Vec::new();
    }
    cells
        .iter()
        .filter_map(|cell| {
            let distance = reference.distance_to(cell.center);
            (distance <= max_dist).then(|| BandedCell {
                cell: cell.clone(),
                reference_id: reference.id.clone(),
                distance,
                band: DistanceBand::for_distance(distance, bin_width),
                is_masked: false,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{build, Decoder};
    use proptest::prelude::*;

    fn line_of_cells(n: u32) -> Vec<GridCell> {
        let codes: Vec<String> = (0..n).map(|col| format!("AB000{col:03}")).collect();
        build(&codes, &Decoder::new(0.0, 0.0, false)).unwrap()
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(DistanceBand::for_distance(0.0, 500.0).label, "0~500");
        assert_eq!(DistanceBand::for_distance(499.9, 500.0).label, "0~500");
        assert_eq!(DistanceBand::for_distance(1_250.0, 500.0).label, "1000~1500");
        assert_eq!(DistanceBand::for_distance(10.0, 2.5).label, "10~12.5");
    }

    #[test]
    fn test_boundary_goes_to_higher_band() {
        let band = DistanceBand::for_distance(1_000.0, 500.0);
        assert_eq!(band.index, 2);
        assert!(band.contains(1_000.0));
        assert!(!DistanceBand::from_index(1, 500.0).contains(1_000.0));
    }

    #[test]
    fn test_max_dist_inclusive() {
        // centers at y = 50, 150, ..., reference at the origin column center
        let cells = line_of_cells(10);
        let reference = ReferencePoint::new("site", 50.0, 50.0);

        let banded = bin(&cells, &reference, 100.0, 300.0);
        let distances: Vec<f64> = banded.iter().map(|c| c.distance).collect();
        assert_eq!(distances, vec![0.0, 100.0, 200.0, 300.0]);

        let indices: Vec<u32> = banded.iter().map(|c| c.band.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(banded.iter().all(|c| c.reference_id == "site" && !c.is_masked));
    }

    #[test]
    fn test_far_cells_do_not_overflow_band_index() {
        // 5e9 / 1.0 saturates the u32 band index
        let cells = build(["AB000000"], &Decoder::new(5.0e9, 0.0, false)).unwrap();
        let reference = ReferencePoint::new("r", 0.0, 50.0);

        let banded = bin(&cells, &reference, 1.0, 6.0e9);
        assert_eq!(banded.len(), 1);
        assert_eq!(banded[0].band.index, u32::MAX);
        assert!(banded[0].band.hi > banded[0].band.lo);

        let band = DistanceBand::from_index(u32::MAX, 500.0);
        assert_eq!(band.hi, (u32::MAX as f64 + 1.0) * 500.0);
    }

    #[test]
    fn test_invalid_width_bins_nothing() {
        let cells = line_of_cells(5);
        let reference = ReferencePoint::new("r", 50.0, 50.0);
        for width in [0.0, -500.0, f64::NAN, f64::INFINITY] {
            assert!(bin(&cells, &reference, width, 10_000.0).is_empty(), "width {width}");
        }
    }

    #[test]
    fn test_band_count() {
        assert_eq!(BinningConfig::default().band_count(), 20);
        let cfg = BinningConfig {
            bin_width: 300.0,
            ..Default::default()
        };
        assert_eq!(cfg.band_count(), 34);
    }

    #[test]
    fn test_validate() {
        assert!(BinningConfig::default().validate().is_ok());
        let zero = BinningConfig {
            bin_width: 0.0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        let unsorted = BinningConfig {
            gradation_radii: vec![3_000.0, 1_000.0],
            ..Default::default()
        };
        assert!(unsorted.validate().is_err());
    }

    proptest! {
        /// Property: band index never decreases as distance grows
        #[test]
        fn prop_binning_monotonic(a in 0.0f64..20_000.0, b in 0.0f64..20_000.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let w = 500.0;
            prop_assert!(DistanceBand::for_distance(near, w).index <= DistanceBand::for_distance(far, w).index);
            prop_assert!(DistanceBand::for_distance(a, w).contains(a));
        }

        /// Property: k * width lands in band k
        #[test]
        fn prop_multiple_of_width_lands_in_band_k(k in 0u32..200, w in prop::sample::select(vec![100.0f64, 250.0, 500.0, 1000.0])) {
            prop_assert_eq!(DistanceBand::for_distance(k as f64 * w, w).index, k);
        }

        /// Property: nothing beyond max_dist is emitted
        #[test]
        fn prop_no_cell_beyond_max_dist(ref_x in -500.0f64..1500.0, ref_y in -500.0f64..1500.0, max_dist in 0.0f64..3000.0) {
            let cells = line_of_cells(30);
            let reference = ReferencePoint::new("r", ref_x, ref_y);
            let banded = bin(&cells, &reference, 500.0, max_dist);
            prop_assert!(banded.iter().all(|c| c.distance <= max_dist));
            let expected = cells.iter().filter(|c| reference.distance_to(c.center) <= max_dist).count();
            prop_assert_eq!(banded.len(), expected);
        }
    }
}
