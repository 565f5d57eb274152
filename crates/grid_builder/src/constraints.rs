//! Constraint polygon loader
//!
//! 불가용지 폴리곤 (JSON, metric CRS). A file holds either one polygon or an
//! array of polygons:
//!
//! ```json
//! [{"exterior": [{"x": 0, "y": 0}, {"x": 100, "y": 0}, {"x": 100, "y": 100}], "interiors": []}]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::Polygon;
use grid_core::ConstraintUnion;
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize)]
#[serde(untagged)]
enum ConstraintFile {
    Many(Vec<Polygon<f64>>),
    One(Polygon<f64>),
}

/// Polygons from one file, rings closed.
pub fn read_polygons(path: &Path) -> Result<Vec<Polygon<f64>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read constraint file: {}", path.display()))?;
    let parsed: ConstraintFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse constraint polygons: {}", path.display()))?;
    let polygons = match parsed {
        ConstraintFile::Many(polygons) => polygons,
        ConstraintFile::One(polygon) => vec![polygon],
    };
    // Polygon::new closes open rings
    Ok(polygons
        .into_iter()
        .map(|p| {
            let (exterior, interiors) = p.into_inner();
            Polygon::new(exterior, interiors)
        })
        .collect())
}

/// Union of every polygon in every file. No files → empty union.
pub fn load_constraints(paths: &[PathBuf]) -> Result<ConstraintUnion> {
    let mut polygons = Vec::new();
    for path in paths {
        let loaded = read_polygons(path)?;
        info!("[constraints] {}: {} polygons", path.display(), loaded.len());
        polygons.extend(loaded);
    }
    Ok(ConstraintUnion::from_polygons(polygons))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_single_and_array_files() -> Result<()> {
        let one = write_json(
            r#"{"exterior": [{"x": 0, "y": 0}, {"x": 100, "y": 0}, {"x": 100, "y": 100}, {"x": 0, "y": 100}], "interiors": []}"#,
        );
        let many = write_json(
            r#"[
                {"exterior": [{"x": 500, "y": 500}, {"x": 600, "y": 500}, {"x": 600, "y": 600}], "interiors": []},
                {"exterior": [{"x": 900, "y": 900}, {"x": 950, "y": 900}, {"x": 950, "y": 950}], "interiors": []}
            ]"#,
        );

        let polys = read_polygons(one.path())?;
        assert_eq!(polys.len(), 1);
        // ring closed on load
        let ring = &polys[0].exterior().0;
        assert_eq!(ring.first(), ring.last());

        let union = load_constraints(&[one.path().to_path_buf(), many.path().to_path_buf()])?;
        assert_eq!(union.part_count(), 3);
        assert!((union.area() - (10_000.0 + 5_000.0 + 1_250.0)).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_no_files_is_empty_union() -> Result<()> {
        assert!(load_constraints(&[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_bad_json_reports_path() {
        let bad = write_json("{\"type\": \"FeatureCollection\"}");
        let err = load_constraints(&[bad.path().to_path_buf()]).unwrap_err();
        assert!(format!("{err:#}").contains(&bad.path().display().to_string()));
    }
}
