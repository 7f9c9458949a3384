use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unsupported filter operator '{operator}' on '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Invalid filter on '{field}': {message}")]
    InvalidFilter { field: String, message: String },

    #[error("Invalid field mask for '{field}': {message}")]
    InvalidMask { field: String, message: String },

    #[error("Failed to load documents: {0}")]
    Load(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}
