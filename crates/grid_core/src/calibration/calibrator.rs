//! Decoder Calibrator - Blind (row, col) → (x, y) Recovery
//!
//! 목적: (row, col) -> (x, y) 변환을 '거리구간'과 최대한 일치하도록 추정.
//!
//! The grid is known to be uniform (100m cells) and axis-aligned, so the only
//! unknowns are the metric offset of cell (0, 0) and whether row indexes the
//! x-axis or the y-axis. The evidence is a set of records tying a cell to a
//! reference point by a coarse band label such as `"1km~1.5km"`.
//!
//! ## Procedure
//! 1. Drop records whose reference point is unknown.
//! 2. Cap the sample size with a seeded random subset.
//! 3. For each axis hypothesis (`axis_swap = false / true`):
//!    - start from the coordinate-wise median of `reference - index_term`
//!    - greedy random search with a linearly shrinking Gaussian step,
//!      scoring by mean |computed distance - band midpoint|
//! 4. Lower final score wins (ties keep `axis_swap = false`).
//!
//! All randomness comes from explicit `ChaCha8Rng` instances seeded from
//! [`CalibratorConfig`], or from a caller-supplied `Rng` for the lower-level
//! building blocks.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::band_label::band_midpoint;
use crate::error::{GridError, Result};
use crate::grid::{Decoder, GridCode, CELL_SIZE};
use crate::reference::ReferenceSet;

/// Calibrator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibratorConfig {
    /// Maximum number of records used for fitting (기본: 12000)
    pub sample_cap: usize,
    /// Search steps per hypothesis (기본: 250)
    pub iterations: usize,
    /// Initial perturbation sigma in meters (기본: 5000)
    pub step_start: f64,
    /// Final perturbation sigma in meters (기본: 200)
    pub step_end: f64,
    /// Seed for sample selection
    pub seed: u64,
    /// Seed for the local search (re-seeded per hypothesis)
    pub search_seed: u64,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            sample_cap: 12_000,
            iterations: 250,
            step_start: 5_000.0,
            step_end: 200.0,
            seed: 42,
            search_seed: 0,
        }
    }
}

impl CalibratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_cap == 0 {
            return Err(GridError::InvalidConfig(
                "calibration.sample_cap must be > 0".to_string(),
            ));
        }
        if !(self.step_end > 0.0 && self.step_start.is_finite()) {
            return Err(GridError::InvalidConfig(
                "calibration step sizes must be positive and finite".to_string(),
            ));
        }
        if self.step_end > self.step_start {
            return Err(GridError::InvalidConfig(format!(
                "calibration.step_end ({}) must not exceed step_start ({})",
                self.step_end, self.step_start
            )));
        }
        Ok(())
    }
}

/// One labeled observation: cell ↔ reference point ↔ band label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub row: u32,
    pub col: u32,
    pub reference_id: String,
    pub band_label: String,
}

impl CalibrationRecord {
    pub fn new(
        row: u32,
        col: u32,
        reference_id: impl Into<String>,
        band_label: impl Into<String>,
    ) -> Self {
        Self {
            row,
            col,
            reference_id: reference_id.into(),
            band_label: band_label.into(),
        }
    }

    /// Record straight from a raw grid code
    pub fn from_code(
        code: &str,
        reference_id: impl Into<String>,
        band_label: impl Into<String>,
    ) -> Result<Self> {
        let (row, col) = GridCode::parse(code)?.indices();
        Ok(Self::new(row, col, reference_id, band_label))
    }
}

/// Fitting sample in column layout
#[derive(Debug, Clone, Default)]
pub struct CalibrationSample {
    rows: Vec<f64>,
    cols: Vec<f64>,
    ref_x: Vec<f64>,
    ref_y: Vec<f64>,
    target: Vec<f64>,
}

impl CalibrationSample {
    /// Resolve reference coordinates and band midpoints for the given records.
    pub fn from_records(records: &[&CalibrationRecord], references: &ReferenceSet) -> Result<Self> {
        let mut sample = Self {
            rows: Vec::with_capacity(records.len()),
            cols: Vec::with_capacity(records.len()),
            ref_x: Vec::with_capacity(records.len()),
            ref_y: Vec::with_capacity(records.len()),
            target: Vec::with_capacity(records.len()),
        };
        for record in records {
            let reference = references.require(&record.reference_id)?;
            sample.target.push(band_midpoint(&record.band_label)?);
            sample.rows.push(record.row as f64);
            sample.cols.push(record.col as f64);
            sample.ref_x.push(reference.x);
            sample.ref_y.push(reference.y);
        }
        Ok(sample)
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Index columns mapped to (x-axis, y-axis) under a hypothesis
    fn axes(&self, axis_swap: bool) -> (&[f64], &[f64]) {
        if axis_swap {
            (&self.cols, &self.rows)
        } else {
            (&self.rows, &self.cols)
        }
    }

    /// Mean |computed distance - target| for a candidate decoder (L1 오차)
    pub fn score(&self, decoder: &Decoder) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        let (px, py) = self.axes(decoder.axis_swap);
        let total: f64 = (0..self.len())
            .map(|i| {
                let cx = decoder.offset_x + decoder.axis_term(px[i]);
                let cy = decoder.offset_y + decoder.axis_term(py[i]);
                let dist = (cx - self.ref_x[i]).hypot(cy - self.ref_y[i]);
                (dist - self.target[i]).abs()
            })
            .sum();
        total / self.len() as f64
    }

    /// Robust starting offset: coordinate-wise median of `reference - index_term`
    pub fn initial_offset(&self, axis_swap: bool, cell_size: f64) -> (f64, f64) {
        let probe = Decoder::new(0.0, 0.0, axis_swap).with_cell_size(cell_size);
        let (px, py) = self.axes(axis_swap);
        let mut dx: Vec<f64> = (0..self.len())
            .map(|i| self.ref_x[i] - probe.axis_term(px[i]))
            .collect();
        let mut dy: Vec<f64> = (0..self.len())
            .map(|i| self.ref_y[i] - probe.axis_term(py[i]))
            .collect();
        (median(&mut dx), median(&mut dy))
    }
}

/// Median with the mean of the two middle values for even counts.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

/// Fixed, linearly decreasing sigma schedule (`start` → `end`, inclusive).
pub fn step_schedule(start: f64, end: f64, iterations: usize) -> Vec<f64> {
    match iterations {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let delta = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + delta * i as f64).collect()
        }
    }
}

/// Keep records whose reference point is known; returns the kept records and
/// the number dropped.
pub fn filter_known<'a>(
    records: &'a [CalibrationRecord],
    references: &ReferenceSet,
) -> (Vec<&'a CalibrationRecord>, usize) {
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0;
    for record in records {
        if references.contains(&record.reference_id) {
            kept.push(record);
        } else {
            dropped += 1;
            if dropped <= 5 {
                let err = GridError::MissingReference {
                    id: record.reference_id.clone(),
                };
                debug!("[calibrate] dropping record ({}, {}): {}", record.row, record.col, err);
            }
        }
    }
    (kept, dropped)
}

/// Seeded subset of at most `cap` records, input order preserved.
pub fn draw_sample<'a, R: Rng + ?Sized>(
    records: Vec<&'a CalibrationRecord>,
    cap: usize,
    rng: &mut R,
) -> Vec<&'a CalibrationRecord> {
    if records.len() <= cap {
        return records;
    }
    let mut picked = index::sample(rng, records.len(), cap).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| records[i]).collect()
}

/// Outcome of one axis hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HypothesisResult {
    pub axis_swap: bool,
    pub initial_offset: (f64, f64),
    pub initial_score: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub score: f64,
    /// Number of accepted (strictly improving) moves
    pub accepted_moves: usize,
}

/// Greedy hill-climbing from `start`.
///
/// Each step perturbs the current best offset with N(0, sigma²) per axis and
/// keeps it only if the score strictly improves. Worse moves are never
/// accepted.
pub fn search_from<R: Rng + ?Sized>(
    sample: &CalibrationSample,
    axis_swap: bool,
    cell_size: f64,
    start: (f64, f64),
    steps: &[f64],
    rng: &mut R,
) -> HypothesisResult {
    let candidate = |x: f64, y: f64| Decoder::new(x, y, axis_swap).with_cell_size(cell_size);

    let (mut best_x, mut best_y) = start;
    let initial_score = sample.score(&candidate(best_x, best_y));
    let mut best_score = initial_score;
    let mut accepted_moves = 0;

    for &sigma in steps {
        let nx: f64 = StandardNormal.sample(rng);
        let ny: f64 = StandardNormal.sample(rng);
        let (cand_x, cand_y) = (best_x + nx * sigma, best_y + ny * sigma);
        let score = sample.score(&candidate(cand_x, cand_y));
        if score < best_score {
            best_score = score;
            best_x = cand_x;
            best_y = cand_y;
            accepted_moves += 1;
        }
    }

    HypothesisResult {
        axis_swap,
        initial_offset: start,
        initial_score,
        offset_x: best_x,
        offset_y: best_y,
        score: best_score,
        accepted_moves,
    }
}

/// Median start + greedy search for one hypothesis.
pub fn search_hypothesis<R: Rng + ?Sized>(
    sample: &CalibrationSample,
    axis_swap: bool,
    cell_size: f64,
    steps: &[f64],
    rng: &mut R,
) -> HypothesisResult {
    let start = sample.initial_offset(axis_swap, cell_size);
    search_from(sample, axis_swap, cell_size, start, steps, rng)
}

/// Calibration result with diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub decoder: Decoder,
    pub unswapped: HypothesisResult,
    pub swapped: HypothesisResult,
    /// Records used for fitting
    pub sample_size: usize,
    /// Records with a known reference point
    pub usable_records: usize,
    /// Records dropped for naming an unknown reference point
    pub dropped_records: usize,
}

impl Calibration {
    pub fn best(&self) -> &HypothesisResult {
        if self.decoder.axis_swap {
            &self.swapped
        } else {
            &self.unswapped
        }
    }
}

/// Decoder calibrator
#[derive(Debug, Clone)]
pub struct DecoderCalibrator {
    config: CalibratorConfig,
    cell_size: f64,
}

impl Default for DecoderCalibrator {
    fn default() -> Self {
        Self::new(CalibratorConfig::default())
    }
}

impl DecoderCalibrator {
    pub fn new(config: CalibratorConfig) -> Self {
        Self {
            config,
            cell_size: CELL_SIZE,
        }
    }

    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    /// Fit a decoder to the labeled records.
    pub fn calibrate(
        &self,
        records: &[CalibrationRecord],
        references: &ReferenceSet,
    ) -> Result<Calibration> {
        self.config.validate()?;

        let (usable, dropped) = filter_known(records, references);
        if dropped > 0 {
            warn!(
                "[calibrate] dropped {} of {} records naming unknown reference points",
                dropped,
                records.len()
            );
        }
        if usable.is_empty() {
            return Err(GridError::NoCalibrationData(format!(
                "none of {} records name a known reference point",
                records.len()
            )));
        }
        let usable_records = usable.len();

        let mut sample_rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let picked = draw_sample(usable, self.config.sample_cap, &mut sample_rng);
        let sample = CalibrationSample::from_records(&picked, references)?;

        let steps = step_schedule(
            self.config.step_start,
            self.config.step_end,
            self.config.iterations,
        );

        let run = |axis_swap: bool| {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.search_seed);
            let result = search_hypothesis(&sample, axis_swap, self.cell_size, &steps, &mut rng);
            debug!(
                "[calibrate] swap={} start=({:.1}, {:.1}) score {:.2} -> {:.2} ({} moves)",
                axis_swap,
                result.initial_offset.0,
                result.initial_offset.1,
                result.initial_score,
                result.score,
                result.accepted_moves
            );
            result
        };
        let unswapped = run(false);
        let swapped = run(true);

        let winner = if swapped.score < unswapped.score {
            &swapped
        } else {
            &unswapped
        };
        let decoder = Decoder::new(winner.offset_x, winner.offset_y, winner.axis_swap)
            .with_cell_size(self.cell_size);

        info!(
            "[decoder] base_x={:.3}, base_y={:.3}, swap={} (score {:.2}, n={})",
            decoder.offset_x,
            decoder.offset_y,
            decoder.axis_swap,
            winner.score,
            sample.len()
        );

        Ok(Calibration {
            decoder,
            unswapped,
            swapped,
            sample_size: sample.len(),
            usable_records,
            dropped_records: dropped,
        })
    }
}

/// Calibrate with default search parameters and the given sample cap.
pub fn calibrate(
    records: &[CalibrationRecord],
    references: &ReferenceSet,
    sample_cap: usize,
) -> Result<Calibration> {
    DecoderCalibrator::new(CalibratorConfig {
        sample_cap,
        ..Default::default()
    })
    .calibrate(records, references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferencePoint;
    use rand::rngs::StdRng;

    const BASE_X: f64 = 950_000.0;
    const BASE_Y: f64 = 1_940_000.0;
    const GRID_N: u32 = 60;

    /// Three sites inside a 6km x 6km block, none on the block diagonal.
    fn sites() -> ReferenceSet {
        ReferenceSet::new(vec![
            ReferencePoint::new("A", BASE_X + 2_000.0, BASE_Y + 2_500.0),
            ReferencePoint::new("B", BASE_X + 4_200.0, BASE_Y + 3_300.0),
            ReferencePoint::new("C", BASE_X + 2_800.0, BASE_Y + 3_200.0),
        ])
        .unwrap()
    }

    /// Records whose band midpoint equals the true distance.
    fn synthetic_records(truth: &Decoder, references: &ReferenceSet) -> Vec<CalibrationRecord> {
        let mut records = Vec::new();
        for site in references.iter() {
            for row in 0..GRID_N {
                for col in 0..GRID_N {
                    let d = site.distance_to(truth.center(row, col));
                    let label = if (row + col) % 2 == 0 {
                        format!("{}~{}", d * 0.5, d * 1.5)
                    } else {
                        format!("{}km~{}km", d * 0.5 / 1000.0, d * 1.5 / 1000.0)
                    };
                    records.push(CalibrationRecord::new(row, col, site.id.clone(), label));
                }
            }
        }
        records
    }

    fn assert_recovers(truth: Decoder) {
        let references = sites();
        let records = synthetic_records(&truth, &references);
        let result = DecoderCalibrator::default()
            .calibrate(&records, &references)
            .unwrap();

        assert_eq!(result.decoder.axis_swap, truth.axis_swap);
        assert!((result.decoder.offset_x - truth.offset_x).abs() <= CELL_SIZE);
        assert!((result.decoder.offset_y - truth.offset_y).abs() <= CELL_SIZE);
        assert!(result.best().score < 1.0, "best score {}", result.best().score);
        assert_eq!(result.sample_size, records.len());
        assert_eq!(result.dropped_records, 0);
    }

    #[test]
    fn test_recovers_unswapped_decoder() {
        assert_recovers(Decoder::new(BASE_X, BASE_Y, false));
    }

    #[test]
    fn test_recovers_swapped_decoder() {
        assert_recovers(Decoder::new(BASE_X, BASE_Y, true));
    }

    #[test]
    fn test_wrong_hypothesis_scores_worse() {
        let references = sites();
        let truth = Decoder::new(BASE_X, BASE_Y, false);
        let result = DecoderCalibrator::default()
            .calibrate(&synthetic_records(&truth, &references), &references)
            .unwrap();
        assert!(result.swapped.score > result.unswapped.score + 50.0);
    }

    #[test]
    fn test_tie_prefers_unswapped() {
        // row == col: both axis orders see the same data and RNG stream
        let references =
            ReferenceSet::new(vec![ReferencePoint::new("A", 1_000.0, 1_000.0)]).unwrap();
        let records: Vec<CalibrationRecord> = (0..50)
            .map(|i| CalibrationRecord::new(i, i, "A", "0~1000"))
            .collect();

        let result = DecoderCalibrator::default()
            .calibrate(&records, &references)
            .unwrap();
        assert_eq!(result.unswapped.score, result.swapped.score);
        assert!(!result.decoder.axis_swap);
        assert_eq!(result.best(), &result.unswapped);
    }

    #[test]
    fn test_calibration_is_deterministic_with_sampling() {
        let references = sites();
        let records = synthetic_records(&Decoder::new(BASE_X, BASE_Y, true), &references);
        let calibrator = DecoderCalibrator::new(CalibratorConfig {
            sample_cap: 2_000,
            ..Default::default()
        });

        let a = calibrator.calibrate(&records, &references).unwrap();
        let b = calibrator.calibrate(&records, &references).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.sample_size, 2_000);
        assert_eq!(a.usable_records, records.len());
        assert!(a.decoder.axis_swap);
        assert!((a.decoder.offset_x - BASE_X).abs() < 500.0);
        assert!((a.decoder.offset_y - BASE_Y).abs() < 500.0);
    }

    #[test]
    fn test_unknown_references_are_dropped() {
        let references = sites();
        let mut records = synthetic_records(&Decoder::new(BASE_X, BASE_Y, false), &references);
        records.push(CalibrationRecord::new(1, 1, "월드컵공원", "0~500"));
        records.push(CalibrationRecord::new(2, 2, "월드컵공원", "not a label"));

        let result = DecoderCalibrator::default()
            .calibrate(&records, &references)
            .unwrap();
        assert_eq!(result.dropped_records, 2);
        assert_eq!(result.usable_records, records.len() - 2);
    }

    #[test]
    fn test_no_calibration_data() {
        let references = sites();
        let records = vec![CalibrationRecord::new(1, 1, "nowhere", "0~500")];
        let err = DecoderCalibrator::default()
            .calibrate(&records, &references)
            .unwrap_err();
        assert!(matches!(err, GridError::NoCalibrationData(_)));

        let err = DecoderCalibrator::default()
            .calibrate(&[], &references)
            .unwrap_err();
        assert!(matches!(err, GridError::NoCalibrationData(_)));
    }

    #[test]
    fn test_malformed_label_in_sample_propagates() {
        let references = sites();
        let records = vec![
            CalibrationRecord::new(1, 1, "A", "0~500"),
            CalibrationRecord::new(2, 2, "B", "far"),
        ];
        let err = DecoderCalibrator::default()
            .calibrate(&records, &references)
            .unwrap_err();
        assert_eq!(
            err,
            GridError::MalformedBandLabel {
                label: "far".to_string()
            }
        );
    }

    #[test]
    fn test_record_from_code() {
        let record = CalibrationRecord::from_code("다사629455", "A", "1km~1.5km").unwrap();
        assert_eq!((record.row, record.col), (629, 455));
        assert!(CalibrationRecord::from_code("다사62945", "A", "0~500").is_err());
    }

    #[test]
    fn test_step_schedule() {
        let steps = step_schedule(5_000.0, 200.0, 250);
        assert_eq!(steps.len(), 250);
        assert_eq!(steps[0], 5_000.0);
        assert!((steps[249] - 200.0).abs() < 1e-9);
        assert!(steps.windows(2).all(|w| w[1] < w[0]));

        assert!(step_schedule(5_000.0, 200.0, 0).is_empty());
        assert_eq!(step_schedule(5_000.0, 200.0, 1), vec![5_000.0]);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&mut []).is_nan());
    }

    #[test]
    fn test_draw_sample_caps_and_keeps_order() {
        let records: Vec<CalibrationRecord> = (0..100)
            .map(|i| CalibrationRecord::new(i, 0, "A", "0~500"))
            .collect();
        let refs: Vec<&CalibrationRecord> = records.iter().collect();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let picked = draw_sample(refs.clone(), 10, &mut rng);
        assert_eq!(picked.len(), 10);
        assert!(picked.windows(2).all(|w| w[0].row < w[1].row));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(draw_sample(refs.clone(), 10, &mut rng), picked);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(draw_sample(refs, 500, &mut rng).len(), 100);
    }

    #[test]
    fn test_greedy_search_never_worsens() {
        let references = sites();
        let truth = Decoder::new(BASE_X, BASE_Y, false);
        let records = synthetic_records(&truth, &references);
        let picked: Vec<&CalibrationRecord> = records.iter().collect();
        let sample = CalibrationSample::from_records(&picked, &references).unwrap();

        let start = (BASE_X + 3_000.0, BASE_Y - 1_500.0);
        let steps = step_schedule(5_000.0, 200.0, 250);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = search_from(&sample, false, CELL_SIZE, start, &steps, &mut rng);

        assert!(result.accepted_moves > 0);
        assert!(result.score < result.initial_score);
        let start_err = (start.0 - BASE_X).hypot(start.1 - BASE_Y);
        let end_err = (result.offset_x - BASE_X).hypot(result.offset_y - BASE_Y);
        assert!(end_err < start_err, "{end_err} >= {start_err}");
    }

    #[test]
    fn test_search_accepts_injected_rng() {
        let references = sites();
        let records = synthetic_records(&Decoder::new(BASE_X, BASE_Y, false), &references);
        let picked: Vec<&CalibrationRecord> = records.iter().take(500).collect();
        let sample = CalibrationSample::from_records(&picked, &references).unwrap();
        let steps = step_schedule(1_000.0, 100.0, 20);

        let a = search_hypothesis(&sample, true, CELL_SIZE, &steps, &mut StdRng::seed_from_u64(1234));
        let b = search_hypothesis(&sample, true, CELL_SIZE, &steps, &mut StdRng::seed_from_u64(1234));
        assert_eq!(a, b);
        assert!(a.score <= a.initial_score);
    }
}
