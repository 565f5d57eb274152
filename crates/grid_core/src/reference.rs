//! Reference points (sites)
//!
//! Fixed, externally supplied points with exact metric coordinates. The core
//! does not care how many there are or what they are called.

use std::collections::HashMap;

use geo::{coord, Coord};
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::projection::wgs84_to_korea_unified;

/// Site with a metric coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl ReferencePoint {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }

    /// Site given in WGS84 degrees, projected to EPSG:5179
    pub fn from_wgs84(id: impl Into<String>, lon: f64, lat: f64) -> Self {
        let p = wgs84_to_korea_unified(lon, lat);
        Self::new(id, p.x, p.y)
    }

    pub fn coord(&self) -> Coord<f64> {
        coord! { x: self.x, y: self.y }
    }

    /// Euclidean distance to a metric point
    pub fn distance_to(&self, point: Coord<f64>) -> f64 {
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Ordered reference points with lookup by id
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    points: Vec<ReferencePoint>,
    by_id: HashMap<String, usize>,
}

impl ReferenceSet {
    /// Build a set; duplicate ids are rejected.
    pub fn new(points: Vec<ReferencePoint>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(points.len());
        for (idx, point) in points.iter().enumerate() {
            if by_id.insert(point.id.clone(), idx).is_some() {
                return Err(GridError::InvalidConfig(format!(
                    "duplicate reference point id {:?}",
                    point.id
                )));
            }
        }
        Ok(Self { points, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&ReferencePoint> {
        self.by_id.get(id).map(|&idx| &self.points[idx])
    }

    /// Lookup that reports an unknown id as [`GridError::MissingReference`].
    pub fn require(&self, id: &str) -> Result<&ReferencePoint> {
        self.get(id).ok_or_else(|| GridError::MissingReference { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferencePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
