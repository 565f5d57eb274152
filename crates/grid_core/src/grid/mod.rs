//! Grid System
//!
//! - `code`: opaque code grammar → (row, col)
//! - `decoder`: (row, col) → metric center / cell polygon
//! - `geometry`: batch cell construction

pub mod code;
pub mod decoder;
pub mod geometry;

pub use code::{parse, GridCode, AXIS_SPAN, DIGIT_LEN, PREFIX_LEN};
pub use decoder::{Decoder, CELL_SIZE};
pub use geometry::{build, GridCell};
