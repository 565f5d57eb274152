//! Site summary
//!
//! Per-band and per-ring cell counts for one reference point. Rings follow
//! the gradation radii (1/3/5/10km by default): a cell belongs to the first
//! ring whose radius is >= its distance.

use serde::{Deserialize, Serialize};

use super::binning::{format_meters, BandedCell, BinningConfig, DistanceBand};

/// Counts for one distance band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSummary {
    pub index: u32,
    pub label: String,
    pub cells: usize,
    pub masked: usize,
}

/// Counts for one gradation ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSummary {
    /// Outer radius; `None` for cells beyond the last radius
    pub radius: Option<f64>,
    pub label: String,
    pub cells: usize,
    pub masked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub reference_id: String,
    pub total_cells: usize,
    pub masked_cells: usize,
    pub bands: Vec<BandSummary>,
    pub rings: Vec<RingSummary>,
}

impl SiteSummary {
    /// Cells left for analysis after masking
    pub fn available_cells(&self) -> usize {
        self.total_cells - self.masked_cells
    }
}

/// Ring index of a distance: first radius with `distance <= radius`,
/// or `radii.len()` when beyond all of them.
pub fn ring_index(distance: f64, radii: &[f64]) -> usize {
    radii
        .iter()
        .position(|&r| distance <= r)
        .unwrap_or(radii.len())
}

pub fn summarize(reference_id: &str, cells: &[BandedCell], config: &BinningConfig) -> SiteSummary {
    let band_count = config.band_count() as usize;
    let mut bands: Vec<BandSummary> = (0..band_count as u32)
        .map(|index| {
            let band = DistanceBand::from_index(index, config.bin_width);
            BandSummary {
                index,
                label: band.label,
                cells: 0,
                masked: 0,
            }
        })
        .collect();

    let radii = &config.gradation_radii;
    let mut rings: Vec<RingSummary> = radii
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            let inner = if i == 0 { 0.0 } else { radii[i - 1] };
            RingSummary {
                radius: Some(r),
                label: format!("{}~{}", format_meters(inner), format_meters(r)),
                cells: 0,
                masked: 0,
            }
        })
        .collect();

    let mut masked_cells = 0;
    for cell in cells {
        let masked = usize::from(cell.is_masked);
        masked_cells += masked;

        let idx = cell.band.index as usize;
        if idx >= bands.len() {
            // distance == max_dist on an exact multiple of the band width
            bands.push(BandSummary {
                index: cell.band.index,
                label: cell.band.label.clone(),
                cells: 0,
                masked: 0,
            });
        }
        if let Some(band) = bands.iter_mut().find(|b| b.index == cell.band.index) {
            band.cells += 1;
            band.masked += masked;
        }

        let ring = ring_index(cell.distance, radii);
        if ring == rings.len() {
            let last = radii.last().copied().unwrap_or(0.0);
            rings.push(RingSummary {
                radius: None,
                label: format!("{}~", format_meters(last)),
                cells: 0,
                masked: 0,
            });
        }
        rings[ring].cells += 1;
        rings[ring].masked += masked;
    }

    SiteSummary {
        reference_id: reference_id.to_string(),
        total_cells: cells.len(),
        masked_cells,
        bands,
        rings,
    }
}
