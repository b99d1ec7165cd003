use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    Url(#[from] mysql_async::UrlError),

    /// An operation needed an open connection.
    #[error("Connection is not open")]
    NotOpen,

    /// A result row could not be read into values.
    #[error("Scan error: {0}")]
    Scan(String),

    /// Executing a statement failed at the application level.
    #[error("Write error: {0}")]
    Write(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
