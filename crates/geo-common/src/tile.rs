//! XYZ tile coordinates and their bounds.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Half the width of the Web Mercator world in meters.
pub const WEB_MERCATOR_EXTENT: f64 = 20037508.342789244;

/// A tile coordinate (z/x/y), XYZ scheme with row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether the column and row exist at this zoom level.
    pub fn is_valid(&self) -> bool {
        if self.z > 30 {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }
}

/// Bounds of a tile in Web Mercator (EPSG:3857) meters.
pub fn mercator_tile_bbox(coord: &TileCoord) -> BoundingBox {
    let n = 2f64.powi(coord.z as i32);
    let tile_size = 2.0 * WEB_MERCATOR_EXTENT / n;

    let min_x = -WEB_MERCATOR_EXTENT + coord.x as f64 * tile_size;
    let max_y = WEB_MERCATOR_EXTENT - coord.y as f64 * tile_size;

    BoundingBox::new(min_x, max_y - tile_size, min_x + tile_size, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_zero_covers_world() {
        let bbox = mercator_tile_bbox(&TileCoord::new(0, 0, 0));
        assert!((bbox.min_x + WEB_MERCATOR_EXTENT).abs() < 1e-6);
        assert!((bbox.max_y - WEB_MERCATOR_EXTENT).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_one_quadrants() {
        let nw = mercator_tile_bbox(&TileCoord::new(1, 0, 0));
        assert!(nw.max_x.abs() < 1e-6);
        assert!(nw.min_y.abs() < 1e-6);

        let se = mercator_tile_bbox(&TileCoord::new(1, 1, 1));
        assert!(se.min_x.abs() < 1e-6);
        assert!((se.min_y + WEB_MERCATOR_EXTENT).abs() < 1e-6);
    }

    #[test]
    fn test_is_valid() {
        assert!(TileCoord::new(2, 3, 3).is_valid());
        assert!(!TileCoord::new(2, 4, 0).is_valid());
        assert!(!TileCoord::new(31, 0, 0).is_valid());
    }
}
