use crate::error::SinkError;
use async_trait::async_trait;
use model::core::value::Value;

pub mod database;
pub mod file;

pub use database::DatabaseSink;
pub use file::FileSink;

/// Destination of flushed INSERT statements.
///
/// Each `write` receives one complete statement: the fragments joined with
/// no separator form its text and `params` are its bound values in
/// placeholder order (empty for literal statements). A sink may treat
/// every call as one unit of work.
#[async_trait]
pub trait Sink: Send {
    async fn write(&mut self, fragments: &[String], params: &[Value]) -> Result<(), SinkError>;

    /// Human-readable identity (file path or destination table) for logs.
    fn describe(&self) -> String;
}
