//! WGS84 → Korea 2000 / Unified CS (EPSG:5179)
//!
//! Transverse Mercator on the GRS80 ellipsoid (Snyder series, USGS PP 1395).
//! Used to place reference points given as longitude/latitude into the grid's
//! metric coordinate system.

use geo::{coord, Coord};

/// GRS80 semi-major axis (m)
const SEMI_MAJOR: f64 = 6_378_137.0;
/// GRS80 flattening
const FLATTENING: f64 = 1.0 / 298.257_222_101;

/// EPSG:5179 projection parameters
const LAT_ORIGIN_DEG: f64 = 38.0;
const LON_ORIGIN_DEG: f64 = 127.5;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 1_000_000.0;
const FALSE_NORTHING: f64 = 2_000_000.0;

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    SEMI_MAJOR
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Project WGS84 longitude/latitude (degrees) to EPSG:5179 easting/northing.
pub fn wgs84_to_korea_unified(lon: f64, lat: f64) -> Coord<f64> {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let ep2 = e2 / (1.0 - e2);

    let phi = lat.to_radians();
    let lam = lon.to_radians();
    let phi0 = LAT_ORIGIN_DEG.to_radians();
    let lam0 = LON_ORIGIN_DEG.to_radians();

    let (sin_phi, cos_phi) = phi.sin_cos();
    let n = SEMI_MAJOR / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = phi.tan().powi(2);
    let c = ep2 * cos_phi * cos_phi;
    let a = (lam - lam0) * cos_phi;

    let m = meridian_arc(phi, e2);
    let m0 = meridian_arc(phi0, e2);

    let x = FALSE_EASTING
        + SCALE_FACTOR
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
    let y = FALSE_NORTHING
        + SCALE_FACTOR
            * (m - m0
                + n * phi.tan()
                    * (a * a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));

    coord! { x: x, y: y }
}
