//! Analysis pipeline
//!
//! codes + decoder → cell geometry (once) → per site: bin → mask → summary
//!
//! The decoder is handed in by the caller and stored by value. It is never
//! recalibrated here; to analyse with a different decoder, build a new
//! [`GridAnalysis`].

use tracing::info;

use crate::analysis::{bin, mask, summarize, BandedCell, BinningConfig, ConstraintUnion, SiteSummary};
use crate::calibration::{Calibration, CalibrationRecord, DecoderCalibrator};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::grid::{build, Decoder, GridCell};
use crate::reference::{ReferencePoint, ReferenceSet};

/// Analysis-ready cells for one reference point
#[derive(Debug, Clone)]
pub struct SiteAnalysis {
    pub reference: ReferencePoint,
    pub cells: Vec<BandedCell>,
    pub summary: SiteSummary,
}

/// Cell geometry built with a fixed decoder, plus the constraint union
#[derive(Debug, Clone)]
pub struct GridAnalysis {
    decoder: Decoder,
    cells: Vec<GridCell>,
    constraints: ConstraintUnion,
    binning: BinningConfig,
}

impl GridAnalysis {
    /// Build geometry for every code. Fails on the first malformed code.
    pub fn new<I, S>(
        codes: I,
        decoder: Decoder,
        constraints: ConstraintUnion,
        binning: BinningConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        binning.validate()?;
        let cells = build(codes, &decoder)?;
        info!(
            "[grid] built {} cells (swap={}, {} constraint parts)",
            cells.len(),
            decoder.axis_swap,
            constraints.part_count()
        );
        Ok(Self {
            decoder,
            cells,
            constraints,
            binning,
        })
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn constraints(&self) -> &ConstraintUnion {
        &self.constraints
    }

    pub fn binning(&self) -> &BinningConfig {
        &self.binning
    }

    /// Bin → mask → summarize for one reference point.
    pub fn analyze_site(&self, reference: &ReferencePoint) -> SiteAnalysis {
        let mut cells = bin(
            &self.cells,
            reference,
            self.binning.bin_width,
            self.binning.max_dist,
        );
        mask(&mut cells, &self.constraints);
        let summary = summarize(&reference.id, &cells, &self.binning);
        info!(
            "[site] {}: {} cells within {}m, {} masked",
            reference.id,
            summary.total_cells,
            self.binning.max_dist,
            summary.masked_cells
        );
        SiteAnalysis {
            reference: reference.clone(),
            cells,
            summary,
        }
    }

    /// Every reference point, in set order.
    pub fn analyze_all(&self, references: &ReferenceSet) -> Vec<SiteAnalysis> {
        references.iter().map(|r| self.analyze_site(r)).collect()
    }
}

/// Calibrate from labeled records, then build the analysis with that decoder.
pub fn calibrate_and_build<I, S>(
    records: &[CalibrationRecord],
    codes: I,
    constraints: ConstraintUnion,
    config: &AnalysisConfig,
) -> Result<(Calibration, GridAnalysis)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    config.validate()?;
    let references = config.references()?;
    let calibration = DecoderCalibrator::new(config.calibration.clone())
        .with_cell_size(config.grid.cell_size)
        .calibrate(records, &references)?;
    let analysis = GridAnalysis::new(
        codes,
        calibration.decoder,
        constraints,
        config.binning.clone(),
    )?;
    Ok((calibration, analysis))
}
