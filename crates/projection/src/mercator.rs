//! Spherical Web Mercator projection (EPSG:3857).
//!
//! Maps WGS84 longitude/latitude onto a square plane in meters using the
//! spherical formulas with the WGS84 semi-major axis as the sphere radius.
//! Latitudes beyond the square's edge (about ±85.0511°) are clamped.

use std::f64::consts::PI;

use geo_common::Position;

use crate::ProjectionError;

/// Web Mercator projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    /// Sphere radius (meters)
    pub radius: f64,
    /// Latitude clamp in degrees
    pub max_latitude: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: 6378137.0,
            max_latitude: 85.05112877980659,
        }
    }
}

impl WebMercator {
    /// Project `[lon, lat]` degrees into `[x, y]` meters.
    pub fn forward(&self, p: Position) -> Result<Position, ProjectionError> {
        let [lon, lat] = check_finite(p)?;
        let lat = lat.clamp(-self.max_latitude, self.max_latitude);

        let x = self.radius * lon.to_radians();
        let y = self.radius * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();

        Ok([x, y])
    }

    /// Unproject `[x, y]` meters into `[lon, lat]` degrees.
    pub fn inverse(&self, p: Position) -> Result<Position, ProjectionError> {
        let [x, y] = check_finite(p)?;

        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();

        Ok([lon, lat])
    }
}

fn check_finite(p: Position) -> Result<Position, ProjectionError> {
    if p[0].is_finite() && p[1].is_finite() {
        Ok(p)
    } else {
        Err(ProjectionError::NonFiniteCoordinate { x: p[0], y: p[1] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::tile::WEB_MERCATOR_EXTENT;

    #[test]
    fn test_origin_maps_to_origin() {
        let proj = WebMercator::default();
        let [x, y] = proj.forward([0.0, 0.0]).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_maps_to_extent() {
        let proj = WebMercator::default();
        let [x, _] = proj.forward([180.0, 0.0]).unwrap();
        assert!((x - WEB_MERCATOR_EXTENT).abs() < 1e-6);
    }

    #[test]
    fn test_latitude_is_clamped() {
        let proj = WebMercator::default();
        let [_, y] = proj.forward([0.0, 90.0]).unwrap();
        assert!((y - WEB_MERCATOR_EXTENT).abs() < 1e-3, "y = {}", y);
    }

    #[test]
    fn test_roundtrip_san_francisco() {
        let proj = WebMercator::default();
        let original = [-122.4194, 37.7749];

        let projected = proj.forward(original).unwrap();
        let [lon, lat] = proj.inverse(projected).unwrap();

        assert!((lon - original[0]).abs() < 1e-9, "lon roundtrip failed: {}", lon);
        assert!((lat - original[1]).abs() < 1e-9, "lat roundtrip failed: {}", lat);
    }

    #[test]
    fn test_non_finite_rejected() {
        let proj = WebMercator::default();
        assert!(proj.forward([f64::NAN, 0.0]).is_err());
        assert!(proj.inverse([0.0, f64::INFINITY]).is_err());
    }
}
