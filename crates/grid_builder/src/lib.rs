//! Grid Builder Library
//!
//! 격자 레코드 CSV → 디코더 보정 → 대상지별 거리구간 테이블
//! - `records`: CSV 레코드 로더 (격자코드 / 대상지 / 거리구간)
//! - `constraints`: 불가용지 폴리곤 로더
//! - `export`: CSV + manifest.json 출력, 디코더 저장/로드

pub mod constraints;
pub mod export;
pub mod records;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_core::{AnalysisConfig, Calibration, Decoder, DecoderCalibrator, GridAnalysis};
use tracing::info;

pub use constraints::{load_constraints, read_polygons};
pub use export::{
    export_run, load_decoder, save_decoder, verify_output, OutputFile, RunManifest, SiteEntry,
};
pub use records::{load_records, read_records, RawRecord, RecordColumns, RecordTable};

/// Config file or the built-in Seoul stadium preset.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => {
            info!("[config] no config given, using Seoul stadium preset");
            AnalysisConfig::seoul_stadiums()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Calibrate a decoder from a labeled record CSV.
pub fn calibrate_from_csv(
    records_path: &Path,
    config: &AnalysisConfig,
    columns: &RecordColumns,
) -> Result<Calibration> {
    let table = load_records(records_path, columns, true)?;
    info!("[records] {} rows from {}", table.len(), records_path.display());

    let records = table.calibration_records()?;
    let references = config.references()?;
    let calibration = DecoderCalibrator::new(config.calibration.clone())
        .with_cell_size(config.grid.cell_size)
        .calibrate(&records, &references)?;
    Ok(calibration)
}

/// Inputs of one analysis run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub records: PathBuf,
    pub config: Option<PathBuf>,
    /// Saved decoder; skips calibration when given
    pub decoder: Option<PathBuf>,
    pub constraints: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub columns: RecordColumns,
}

impl RunOptions {
    pub fn new(records: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            records: records.into(),
            config: None,
            decoder: None,
            constraints: Vec::new(),
            out_dir: out_dir.into(),
            columns: RecordColumns::default(),
        }
    }
}

/// records → decoder (saved or calibrated) → cells → per-site bands → files
pub fn run_analysis(options: &RunOptions) -> Result<RunManifest> {
    let config = load_config(options.config.as_deref())?;
    let references = config.references()?;

    let require_labels = options.decoder.is_none();
    let table = load_records(&options.records, &options.columns, require_labels)?;
    info!(
        "[records] {} rows from {}",
        table.len(),
        options.records.display()
    );

    let (decoder, calibration): (Decoder, Option<Calibration>) = match &options.decoder {
        Some(path) => {
            let decoder = load_decoder(path)?;
            info!(
                "[decoder] loaded base_x={:.3}, base_y={:.3}, swap={}",
                decoder.offset_x, decoder.offset_y, decoder.axis_swap
            );
            (decoder, None)
        }
        None => {
            let records = table.calibration_records()?;
            let calibration = DecoderCalibrator::new(config.calibration.clone())
                .with_cell_size(config.grid.cell_size)
                .calibrate(&records, &references)?;
            (calibration.decoder, Some(calibration))
        }
    };

    let constraints = load_constraints(&options.constraints)?;
    let analysis = GridAnalysis::new(table.codes(), decoder, constraints, config.binning.clone())?;
    let sites = analysis.analyze_all(&references);

    export_run(&options.out_dir, &decoder, calibration.as_ref(), &sites)
}
