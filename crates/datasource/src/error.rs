use geo_common::GeoError;
use projection::ProjectionError;
use storage::StoreError;
use thiserror::Error;

/// Failures of a shape fetch. None are retried; callers re-issue the request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Store query failed at offset {skip}: {source}")]
    Store {
        skip: usize,
        #[source]
        source: StoreError,
    },

    #[error("Malformed record at offset {offset}: {message}")]
    MalformedRecord { offset: usize, message: String },

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("Page task failed: {0}")]
    Join(String),

    #[error("Page size must be positive")]
    InvalidPageSize,
}

impl From<FetchError> for GeoError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Store { .. } => GeoError::DatabaseError(err.to_string()),
            FetchError::MalformedRecord { .. } => GeoError::MalformedRecord(err.to_string()),
            FetchError::Projection(ProjectionError::UnsupportedCrs(code)) => {
                GeoError::InvalidCrs(code)
            }
            FetchError::Projection(e) => GeoError::ProjectionError(e.to_string()),
            FetchError::Cancelled => GeoError::ServiceUnavailable(err.to_string()),
            FetchError::Join(_) | FetchError::InvalidPageSize => {
                GeoError::InternalError(err.to_string())
            }
        }
    }
}

/// Invalid source configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Geometry key must not be empty")]
    EmptyKey,

    #[error("Page size must be positive")]
    ZeroPageSize,

    #[error("Unsupported native projection: {0}")]
    UnsupportedProjection(String),

    #[error("Invalid field selection: {0}")]
    InvalidSelect(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_error_mapping() {
        let store: GeoError = FetchError::Store {
            skip: 10,
            source: StoreError::Query("boom".into()),
        }
        .into();
        assert_eq!(store.http_status_code(), 500);
        assert!(store.to_string().contains("offset 10"));

        let crs: GeoError =
            FetchError::Projection(ProjectionError::UnsupportedCrs("EPSG:2263".into())).into();
        assert!(matches!(crs, GeoError::InvalidCrs(ref c) if c == "EPSG:2263"));
        assert_eq!(crs.http_status_code(), 400);

        let cancelled: GeoError = FetchError::Cancelled.into();
        assert_eq!(cancelled.http_status_code(), 503);
    }
}
