//! # grid_core - Coded Grid Calibration & Site Distance Analysis
//!
//! Recovers metric positions for cells of an undocumented 100m grid that is
//! only known through opaque codes (`"다사629455"`), then measures distance
//! bands from reference sites and flags cells overlapping excluded areas.
//!
//! ## Pipeline
//! 1. [`calibration::DecoderCalibrator`] infers the `(row, col) → (x, y)`
//!    [`grid::Decoder`] from band-labeled records
//! 2. [`grid::build`] turns codes into center + square polygon
//! 3. [`analysis::bin`] keeps cells within `max_dist` and assigns bands
//! 4. [`analysis::mask`] flags cells touching the [`analysis::ConstraintUnion`]
//!
//! ## Features
//! - Deterministic calibration (same seed = same decoder)
//! - Decoder is an explicit value; nothing is cached globally
//! - YAML/JSON configuration with WGS84 or metric reference points

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod grid;
pub mod pipeline;
pub mod projection;
pub mod reference;

pub use analysis::{BandedCell, BinningConfig, ConstraintUnion, DistanceBand, SiteSummary};
pub use calibration::{
    Calibration, CalibrationRecord, CalibratorConfig, DecoderCalibrator, HypothesisResult,
};
pub use config::{AnalysisConfig, Location, ReferencePointSpec};
pub use error::{GridError, Result};
pub use grid::{Decoder, GridCell, GridCode, CELL_SIZE};
pub use pipeline::{calibrate_and_build, GridAnalysis, SiteAnalysis};
pub use reference::{ReferencePoint, ReferenceSet};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
