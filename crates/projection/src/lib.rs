//! Coordinate reference system transformations.
//!
//! Geographic WGS84/NAD83 degrees and spherical Web Mercator meters are
//! handled directly; every other EPSG code goes through proj4rs.

pub mod error;
pub mod mercator;
pub mod proj4;
pub mod transform;

pub use error::ProjectionError;
pub use geo_common::normalize_crs_identifier;
pub use mercator::WebMercator;
pub use proj4::Proj4Transform;
pub use transform::{
    project_feature_collection, project_geometry, project_point, Transform,
};
