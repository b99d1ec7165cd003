use connectors::error::AdapterError;
use engine_core::error::SinkError;
use engine_processing::error::ProcessorError;
use planner::query::pagination::PaginationError;
use thiserror::Error;

/// Failure of a single dataset copy.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Invalid pagination: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Destination error: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("Failed to prepare output directory: {0}")]
    OutputDir(#[source] std::io::Error),
}
