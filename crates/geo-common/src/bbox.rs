//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::geojson::Position;

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a bounding box from its southwest and northeast corners.
    pub fn from_corners(sw: Position, ne: Position) -> Self {
        Self::new(sw[0], sw[1], ne[0], ne[1])
    }

    /// Parse a BBOX query parameter: "minx,miny,maxx,maxy"
    pub fn parse(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Southwest (min x, min y) corner.
    pub fn sw(&self) -> Position {
        [self.min_x, self.min_y]
    }

    /// Northeast (max x, max y) corner.
    pub fn ne(&self) -> Position {
        [self.max_x, self.max_y]
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// The `[[minX, minY], [maxX, maxY]]` pair used by box query operators.
    pub fn as_box_pair(&self) -> [Position; 2] {
        [self.sw(), self.ne()]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}
