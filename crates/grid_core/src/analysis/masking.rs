//! Constraint Masker
//!
//! 불가용지 union 과 교차하는 격자 마스킹. Touching a constraint boundary
//! counts as intersecting.

use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon, Polygon, Rect};
use tracing::debug;

use super::binning::BandedCell;

/// Merged excluded-area region, built once and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ConstraintUnion {
    /// Union members with their bounding boxes
    parts: Vec<(Rect<f64>, Polygon<f64>)>,
}

impl ConstraintUnion {
    /// No constraints: nothing is ever masked.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Union of all input polygons.
    pub fn from_polygons<I>(polygons: I) -> Self
    where
        I: IntoIterator<Item = Polygon<f64>>,
    {
        let mut merged = MultiPolygon::new(Vec::new());
        let mut inputs = 0usize;
        for polygon in polygons {
            if polygon.exterior().0.is_empty() {
                continue;
            }
            inputs += 1;
            merged = if merged.0.is_empty() {
                MultiPolygon::new(vec![polygon])
            } else {
                merged.union(&MultiPolygon::new(vec![polygon]))
            };
        }
        debug!(
            "[mask] merged {} constraint polygons into {} parts",
            inputs,
            merged.0.len()
        );
        Self::from_multi_polygon(merged)
    }

    /// Wrap an already merged region.
    pub fn from_multi_polygon(region: MultiPolygon<f64>) -> Self {
        let parts = region
            .0
            .into_iter()
            .filter_map(|polygon| polygon.bounding_rect().map(|bbox| (bbox, polygon)))
            .collect();
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn area(&self) -> f64 {
        self.parts.iter().map(|(_, p)| p.unsigned_area()).sum()
    }

    /// True when `polygon` overlaps or touches the region.
    pub fn intersects(&self, polygon: &Polygon<f64>) -> bool {
        let Some(bbox) = polygon.bounding_rect() else {
            return false;
        };
        self.parts
            .iter()
            .any(|(part_bbox, part)| part_bbox.intersects(&bbox) && part.intersects(polygon))
    }
}

/// Set `is_masked` on every cell. An empty union clears all flags.
pub fn mask(cells: &mut [BandedCell], constraints: &ConstraintUnion) {
    for cell in cells.iter_mut() {
        cell.is_masked = constraints.intersects(&cell.cell.polygon);
    }
}
