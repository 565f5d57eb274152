//! Analysis Configuration
//!
//! 모든 튜닝 상수를 한 곳에서 관리 (YAML / JSON).
//!
//! ```yaml
//! grid:
//!   cell_size: 100
//! calibration:
//!   sample_cap: 12000
//!   seed: 42
//! binning:
//!   bin_width: 500
//!   max_dist: 10000
//! reference_points:
//!   - { id: 잠실야구장, lon: 127.0719, lat: 37.5123 }
//!   - { id: site-b, x: 953000.0, y: 1951000.0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::BinningConfig;
use crate::calibration::CalibratorConfig;
use crate::error::{GridError, Result};
use crate::grid::CELL_SIZE;
use crate::reference::{ReferencePoint, ReferenceSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge length in meters (기본: 100)
    pub cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
        }
    }
}

/// Where a reference point sits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    /// Already in the grid's metric CRS
    Metric { x: f64, y: f64 },
    /// WGS84 degrees, projected to EPSG:5179
    Wgs84 { lon: f64, lat: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePointSpec {
    pub id: String,
    #[serde(flatten)]
    pub location: Location,
}

impl ReferencePointSpec {
    pub fn resolve(&self) -> ReferencePoint {
        match self.location {
            Location::Metric { x, y } => ReferencePoint::new(self.id.clone(), x, y),
            Location::Wgs84 { lon, lat } => ReferencePoint::from_wgs84(self.id.clone(), lon, lat),
        }
    }
}

/// Full analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub grid: GridConfig,
    pub calibration: CalibratorConfig,
    pub binning: BinningConfig,
    pub reference_points: Vec<ReferencePointSpec>,
}

impl AnalysisConfig {
    /// 서울 3개 경기장 (엑셀 '대상지' 값과 반드시 동일해야 함)
    pub fn seoul_stadiums() -> Self {
        let site = |id: &str, lon: f64, lat: f64| ReferencePointSpec {
            id: id.to_string(),
            location: Location::Wgs84 { lon, lat },
        };
        Self {
            reference_points: vec![
                site("잠실야구장", 127.0719, 37.5123),
                site("상암월드컵", 126.8972, 37.5683),
                site("고척돔", 126.8671, 37.4982),
            ],
            ..Default::default()
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.json` → JSON, anything else → YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GridError::ConfigParse(format!("failed to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.grid.cell_size > 0.0 && self.grid.cell_size.is_finite()) {
            return Err(GridError::InvalidConfig(format!(
                "grid.cell_size must be positive, got {}",
                self.grid.cell_size
            )));
        }
        self.calibration.validate()?;
        self.binning.validate()?;
        self.references().map(|_| ())
    }

    /// Resolved reference points (duplicate ids rejected)
    pub fn references(&self) -> Result<ReferenceSet> {
        ReferenceSet::new(self.reference_points.iter().map(|s| s.resolve()).collect())
    }
}
