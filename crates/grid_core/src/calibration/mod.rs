//! Decoder Calibration
//!
//! Infers the affine (row, col) → (x, y) decoder from band-labeled records.
//!
//! - `band_label`: "500m~1km" style labels → numeric interval / midpoint
//! - `calibrator`: sampling, median start, greedy local search, hypothesis selection

pub mod band_label;
pub mod calibrator;

pub use band_label::{band_midpoint, BandRange};
pub use calibrator::{
    calibrate, draw_sample, filter_known, search_from, search_hypothesis, step_schedule,
    Calibration, CalibrationRecord, CalibrationSample, CalibratorConfig, DecoderCalibrator,
    HypothesisResult,
};
