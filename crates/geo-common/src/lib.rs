//! Common types and utilities shared across the shape-tiles crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod geojson;
pub mod tile;

pub use bbox::BoundingBox;
pub use crs::{normalize_crs_identifier, CrsCode};
pub use error::{GeoError, GeoResult};
pub use geojson::{Coord, Feature, FeatureCollection, Geometry, Position};
pub use tile::TileCoord;
