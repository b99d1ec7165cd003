use connectors::sql::base::error::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write to file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to execute statement: {0}")]
    Database(#[from] DbError),

    #[error("Session script failed: {0}")]
    Session(DbError),
}
