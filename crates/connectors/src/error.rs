use crate::sql::base::error::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Unsupported driver error.
    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// Missing required property error.
    #[error("Missing required property: {0}")]
    MissingProperty(String),

    /// Database-related error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
