use crate::sql::base::error::DbError;
use async_trait::async_trait;
use model::core::value::Value;
use tracing::debug;

/// A single database session, used both to read pages from a source and
/// to execute INSERT statements against a destination.
///
/// `open` and `close` are idempotent. Every other operation requires an
/// open connection and fails with [`DbError::NotOpen`] otherwise.
#[async_trait]
pub trait Connection: Send {
    async fn open(&mut self) -> Result<(), DbError>;

    async fn close(&mut self) -> Result<(), DbError>;

    fn is_open(&self) -> bool;

    /// Round-trips to the server without touching any data.
    async fn ping(&mut self) -> Result<(), DbError>;

    /// Runs a query and returns a cursor over its result set. Rows may be
    /// read lazily, so the cursor should be drained or dropped before the
    /// connection runs anything else.
    async fn query(&mut self, sql: &str, args: &[Value]) -> Result<Box<dyn ResultCursor>, DbError>;

    /// Executes a statement with positional parameters and returns the
    /// number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError>;

    /// Executes every `;`-separated statement of `script` in order,
    /// skipping blank ones. Returns how many statements ran.
    async fn execute_script(&mut self, script: &str) -> Result<usize, DbError> {
        let mut executed = 0;
        for statement in split_statements(script) {
            debug!(sql = statement, "Executing session statement");
            self.execute(statement, &[]).await?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Human-readable identity for logs.
    fn describe(&self) -> String;
}

/// Row-at-a-time view over a query result.
#[async_trait]
pub trait ResultCursor: Send {
    /// Column names in result order.
    fn columns(&self) -> &[String];

    /// Moves to the next row. Returns `false` once the result is exhausted.
    async fn advance(&mut self) -> Result<bool, DbError>;

    /// Takes the current row out of the cursor. Valid once per successful
    /// `advance`.
    fn scan(&mut self) -> Result<Vec<Value>, DbError>;
}

/// Splits a script on `;`, dropping empty statements.
pub fn split_statements(script: &str) -> impl Iterator<Item = &str> {
    script.split(';').map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn no_current_row() -> DbError {
    DbError::Scan("no current row; advance the cursor first".into())
}
