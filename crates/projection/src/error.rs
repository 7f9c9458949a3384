//! Projection error types.

use geo_common::crs::CrsParseError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Coordinate ({x}, {y}) cannot be projected")]
    NonFiniteCoordinate { x: f64, y: f64 },

    #[error("Invalid projection definition for {code}: {message}")]
    InvalidDefinition { code: String, message: String },

    #[error("Transform from {from} to {to} failed: {message}")]
    TransformFailed {
        from: String,
        to: String,
        message: String,
    },
}

impl From<CrsParseError> for ProjectionError {
    fn from(err: CrsParseError) -> Self {
        match err {
            CrsParseError::UnsupportedCrs(code) => ProjectionError::UnsupportedCrs(code),
        }
    }
}
