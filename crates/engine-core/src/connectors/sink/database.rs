use crate::{connectors::sink::Sink, error::SinkError};
use async_trait::async_trait;
use connectors::sql::base::connection::Connection;
use model::core::value::Value;
use tracing::info;

/// Executes each statement against a destination connection.
pub struct DatabaseSink {
    conn: Box<dyn Connection>,
    table: String,
}

impl DatabaseSink {
    pub fn new(conn: Box<dyn Connection>, table: &str) -> Self {
        Self {
            conn,
            table: table.to_string(),
        }
    }

    pub async fn open(&mut self) -> Result<(), SinkError> {
        self.conn.open().await?;
        Ok(())
    }

    /// Checks the destination answers before any statement is sent.
    pub async fn ping(&mut self) -> Result<(), SinkError> {
        self.conn.ping().await?;
        Ok(())
    }

    /// Runs a `;`-separated list of session statements, e.g. the
    /// `SET ...` lines that bracket a bulk load.
    pub async fn run_script(&mut self, script: &str) -> Result<(), SinkError> {
        let count = self
            .conn
            .execute_script(script)
            .await
            .map_err(SinkError::Session)?;
        if count > 0 {
            info!(table = %self.table, statements = count, "Session statements executed");
        }
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SinkError> {
        self.conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl Sink for DatabaseSink {
    async fn write(&mut self, fragments: &[String], params: &[Value]) -> Result<(), SinkError> {
        let statement = fragments.concat();
        self.conn.execute(&statement, params).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.table, self.conn.describe())
    }
}
