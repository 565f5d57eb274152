//! Result export
//!
//! Per-site cell tables (CSV) + run manifest (JSON) with SHA256 checksums,
//! and decoder persistence so one calibration can be reused across runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use grid_core::analysis::BandedCell;
use grid_core::{Calibration, Decoder, SiteAnalysis, SiteSummary};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MANIFEST_SCHEMA_VERSION: &str = "v1";
pub const MANIFEST_FILE: &str = "manifest.json";

/// One CSV row
#[derive(Debug, Serialize)]
struct CellRow<'a> {
    code: String,
    row: u32,
    col: u32,
    center_x: f64,
    center_y: f64,
    distance: f64,
    band_index: u32,
    band_label: &'a str,
    is_masked: bool,
}

impl<'a> From<&'a BandedCell> for CellRow<'a> {
    fn from(c: &'a BandedCell) -> Self {
        Self {
            code: c.cell.code.to_string(),
            row: c.cell.row,
            col: c.cell.col,
            center_x: c.cell.center.x,
            center_y: c.cell.center.y,
            distance: c.distance,
            band_index: c.band.index,
            band_label: &c.band.label,
            is_masked: c.is_masked,
        }
    }
}

/// Written file with its checksum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub name: String,
    pub rows: usize,
    /// SHA256 checksum (hex)
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    pub reference_id: String,
    pub x: f64,
    pub y: f64,
    pub summary: SiteSummary,
    pub output: OutputFile,
}

/// Run manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: String,
    /// 생성 시각 (RFC3339 형식)
    pub created_at: String,
    pub decoder: Decoder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
    pub sites: Vec<SiteEntry>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// File-system safe name for a reference id (Hangul is kept).
pub fn file_stem(reference_id: &str) -> String {
    let stem: String = reference_id
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "site".to_string()
    } else {
        stem
    }
}

/// Serialize cells to CSV bytes.
pub fn cells_to_csv(cells: &[BandedCell]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for cell in cells {
        writer
            .serialize(CellRow::from(cell))
            .context("Failed to serialize cell row")?;
    }
    writer.into_inner().context("Failed to flush CSV writer")
}

pub fn write_cells_csv(path: &Path, cells: &[BandedCell]) -> Result<OutputFile> {
    let bytes = cells_to_csv(cells)?;
    fs::write(path, &bytes)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(OutputFile {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        rows: cells.len(),
        checksum: sha256_hex(&bytes),
    })
}

/// Write `cells_<id>.csv` per site plus `manifest.json`.
pub fn export_run(
    out_dir: &Path,
    decoder: &Decoder,
    calibration: Option<&Calibration>,
    sites: &[SiteAnalysis],
) -> Result<RunManifest> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut entries = Vec::with_capacity(sites.len());
    for site in sites {
        let path = out_dir.join(format!("cells_{}.csv", file_stem(&site.reference.id)));
        let output = write_cells_csv(&path, &site.cells)?;
        entries.push(SiteEntry {
            reference_id: site.reference.id.clone(),
            x: site.reference.x,
            y: site.reference.y,
            summary: site.summary.clone(),
            output,
        });
    }

    let manifest = RunManifest {
        schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        decoder: *decoder,
        calibration: calibration.cloned(),
        sites: entries,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    let manifest_path = out_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, json)
        .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
    Ok(manifest)
}

/// Verify an output file against its recorded checksum.
pub fn verify_output(out_dir: &Path, output: &OutputFile) -> Result<bool> {
    let path = out_dir.join(&output.name);
    let bytes =
        fs::read(&path).with_context(|| format!("Failed to read output file: {}", path.display()))?;
    Ok(sha256_hex(&bytes) == output.checksum)
}

pub fn save_decoder(path: &Path, decoder: &Decoder) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(decoder)?;
    fs::write(path, json).with_context(|| format!("Failed to write decoder: {}", path.display()))
}

pub fn load_decoder(path: &Path) -> Result<Decoder> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read decoder: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse decoder: {}", path.display()))
}
