//! Grid geometry builder
//!
//! code + decoder → center + 100m x 100m polygon (center 기준)

use geo::{Coord, Polygon};
use serde::Serialize;

use super::code::GridCode;
use super::decoder::Decoder;
use crate::error::Result;

/// One grid cell with its metric geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub code: GridCode,
    pub row: u32,
    pub col: u32,
    pub center: Coord<f64>,
    pub polygon: Polygon<f64>,
}

impl GridCell {
    /// Build the cell for an already-parsed code.
    pub fn new(code: GridCode, decoder: &Decoder) -> Self {
        let (row, col) = code.indices();
        let center = decoder.center(row, col);
        Self {
            polygon: decoder.cell_polygon(center),
            code,
            row,
            col,
            center,
        }
    }
}

/// Build geometry for every code.
///
/// Fails on the first malformed code: a single bad code means the input file
/// is corrupt, so no partial result is returned.
pub fn build<I, S>(codes: I, decoder: &Decoder) -> Result<Vec<GridCell>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    codes
        .into_iter()
        .map(|code| GridCode::parse(code.as_ref()).map(|c| GridCell::new(c, decoder)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use geo::coord;
    use proptest::prelude::*;

    #[test]
    fn test_build_end_to_end_example() {
        let decoder = Decoder::new(0.0, 0.0, false);
        let cells = build(["AB000000", "AB001000", "AB000001"], &decoder).unwrap();

        let indices: Vec<(u32, u32)> = cells.iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(indices, vec![(0, 0), (1, 0), (0, 1)]);

        let centers: Vec<Coord<f64>> = cells.iter().map(|c| c.center).collect();
        assert_eq!(
            centers,
            vec![
                coord! { x: 50.0, y: 50.0 },
                coord! { x: 150.0, y: 50.0 },
                coord! { x: 50.0, y: 150.0 },
            ]
        );
    }

    #[test]
    fn test_build_fails_fast() {
        let decoder = Decoder::new(0.0, 0.0, false);
        let err = build(["AB000000", "AB00x000", "AB000001"], &decoder).unwrap_err();
        assert_eq!(
            err,
            GridError::MalformedCode {
                code: "AB00x000".to_string()
            }
        );
    }

    #[test]
    fn test_build_is_pure() {
        let decoder = Decoder::new(951_234.5, 1_943_210.25, true);
        let a = build(["다사629455"], &decoder).unwrap();
        let b = build(["다사629455"], &decoder).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        /// Property: centers extracted from built cells equal the decoder formula exactly
        #[test]
        fn prop_centers_round_trip(
            n in 0u32..1_000_000,
            offset_x in -2.0e6f64..2.0e6,
            offset_y in -2.0e6f64..2.0e6,
            swap in any::<bool>(),
        ) {
            let decoder = Decoder::new(offset_x, offset_y, swap);
            let cells = build([format!("다사{n:06}")], &decoder).unwrap();
            let cell = &cells[0];
            prop_assert_eq!(cell.center, decoder.center(cell.row, cell.col));
            prop_assert_eq!(&cell.polygon, &decoder.cell_polygon(cell.center));
        }
    }
}
