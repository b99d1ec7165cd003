use connectors::sql::base::error::DbError;
use engine_core::error::SinkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Source connection failed: {0}")]
    Connection(#[source] DbError),

    #[error("Query failed ({sql}): {source}")]
    Query {
        sql: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to scan row: {0}")]
    Scan(#[source] DbError),

    #[error("No current row: advance() must return true before scan()")]
    NoRow,
}

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error("Failed to write batch to {sink}: {source}")]
    Sink {
        sink: String,
        #[source]
        source: SinkError,
    },
}
