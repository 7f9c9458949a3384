//! Error types surfaced by the shape services.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Primary error type for request handling.
#[derive(Debug, Error)]
pub enum GeoError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    // === Data Errors ===
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // === Storage Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Processing Errors ===
    #[error("Projection error: {0}")]
    ProjectionError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request timeout")]
    Timeout,
}

impl GeoError {
    /// Short machine-readable code for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GeoError::MissingParameter(_) => "MissingParameterValue",
            GeoError::InvalidParameter { .. } => "InvalidParameterValue",
            GeoError::InvalidCrs(_) => "InvalidCRS",
            GeoError::InvalidBbox(_) => "InvalidBBox",
            GeoError::Timeout => "Timeout",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GeoError::MissingParameter(_)
            | GeoError::InvalidParameter { .. }
            | GeoError::InvalidCrs(_)
            | GeoError::InvalidBbox(_) => 400,

            GeoError::ServiceUnavailable(_) => 503,
            GeoError::Timeout => 504,

            _ => 500,
        }
    }
}

impl From<crate::bbox::BboxParseError> for GeoError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        GeoError::InvalidBbox(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GeoError::InvalidBbox("x".into()).http_status_code(), 400);
        assert_eq!(GeoError::DatabaseError("down".into()).http_status_code(), 500);
        assert_eq!(GeoError::Timeout.http_status_code(), 504);
        assert_eq!(GeoError::InvalidCrs("EPSG:1".into()).code(), "InvalidCRS");
    }
}
