//! Decoder - (row, col) → metric coordinate
//!
//! 100m 격자이므로 좌표는 인덱스에 대해 셀 크기 단위 선형 + 상수:
//! - `axis_swap = false`: x = offset_x + row*CELL + CELL/2, y = offset_y + col*CELL + CELL/2
//! - `axis_swap = true` : x = offset_x + col*CELL + CELL/2, y = offset_y + row*CELL + CELL/2
//!
//! A decoder is calibrated once per dataset and then passed by value to every
//! geometry call. Nothing recomputes it behind the caller's back.

use geo::{coord, Coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Cell edge length of the observed grid (meters)
pub const CELL_SIZE: f64 = 100.0;

fn default_cell_size() -> f64 {
    CELL_SIZE
}

/// Calibrated affine decoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoder {
    pub offset_x: f64,
    pub offset_y: f64,
    pub axis_swap: bool,
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
}

impl Decoder {
    pub fn new(offset_x: f64, offset_y: f64, axis_swap: bool) -> Self {
        Self {
            offset_x,
            offset_y,
            axis_swap,
            cell_size: CELL_SIZE,
        }
    }

    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Index pair in (x-axis, y-axis) order for this decoder's axis mapping.
    pub fn axis_indices(&self, row: u32, col: u32) -> (u32, u32) {
        if self.axis_swap {
            (col, row)
        } else {
            (row, col)
        }
    }

    /// Offset-free center term of one axis: `index*CELL + CELL/2`
    pub fn axis_term(&self, index: f64) -> f64 {
        index * self.cell_size + self.cell_size / 2.0
    }

    /// Cell center in metric coordinates
    pub fn center(&self, row: u32, col: u32) -> Coord<f64> {
        let (px, py) = self.axis_indices(row, col);
        coord! {
            x: self.offset_x + self.axis_term(px as f64),
            y: self.offset_y + self.axis_term(py as f64),
        }
    }

    /// Axis-aligned square of side `cell_size` centered on `center`.
    pub fn cell_polygon(&self, center: Coord<f64>) -> Polygon<f64> {
        let half = self.cell_size / 2.0;
        Rect::new(
            coord! { x: center.x - half, y: center.y - half },
            coord! { x: center.x + half, y: center.y + half },
        )
        .to_polygon()
    }
}
