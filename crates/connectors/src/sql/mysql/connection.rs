use crate::sql::{
    base::{
        connection::{Connection, ResultCursor},
        error::DbError,
    },
    mysql::{dsn::to_mysql_url, params::MySqlParamStore, stream::spawn_query},
};
use async_trait::async_trait;
use model::core::value::Value;
use mysql_async::{Conn, Opts, prelude::*};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One MySQL/MariaDB session.
///
/// Query results are streamed: while a cursor is being read the session
/// belongs to the task feeding it, and the next operation waits for the
/// session to come back. Drop or drain a cursor before running anything
/// else on the same connection.
pub struct MySqlConnection {
    opts: Opts,
    conn: Option<Conn>,
    streaming: Option<JoinHandle<Conn>>,
}

impl MySqlConnection {
    pub fn new(dsn: &str) -> Result<Self, DbError> {
        let opts = Opts::from_url(&to_mysql_url(dsn))?;
        Ok(Self {
            opts,
            conn: None,
            streaming: None,
        })
    }

    /// Waits for a streamed result to release the session.
    async fn reclaim(&mut self) -> Result<(), DbError> {
        if let Some(task) = self.streaming.take() {
            let conn = task
                .await
                .map_err(|e| DbError::Unknown(format!("query task failed: {e}")))?;
            self.conn = Some(conn);
        }
        Ok(())
    }

    async fn conn(&mut self) -> Result<&mut Conn, DbError> {
        self.reclaim().await?;
        self.conn.as_mut().ok_or(DbError::NotOpen)
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn open(&mut self) -> Result<(), DbError> {
        if !self.is_open() {
            let conn = Conn::new(self.opts.clone()).await?;
            debug!(connection = %self.describe(), "MySQL connection opened");
            self.conn = Some(conn);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(task) = self.streaming.take() {
            // an unread result must not keep the session alive
            task.abort();
            if let Ok(conn) = task.await {
                self.conn = Some(conn);
            }
        }
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
            debug!(connection = %self.describe(), "MySQL connection closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.conn.is_some() || self.streaming.is_some()
    }

    async fn ping(&mut self) -> Result<(), DbError> {
        self.conn().await?.ping().await?;
        info!(connection = %self.describe(), "MySQL connection is alive");
        Ok(())
    }

    async fn query(&mut self, sql: &str, args: &[Value]) -> Result<Box<dyn ResultCursor>, DbError> {
        self.reclaim().await?;
        let conn = self.conn.take().ok_or(DbError::NotOpen)?;
        let params = (!args.is_empty()).then(|| MySqlParamStore::from_values(args).params());

        let (task, cursor) = spawn_query(conn, sql.to_string(), params).await;
        self.streaming = Some(task);
        Ok(Box::new(cursor?))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let conn = self.conn().await?;
        if params.is_empty() {
            // text protocol: accepts statements that cannot be prepared
            conn.query_drop(sql).await?;
        } else {
            let params = MySqlParamStore::from_values(params).params();
            conn.exec_drop(sql, params).await?;
        }
        Ok(conn.affected_rows())
    }

    fn describe(&self) -> String {
        format!(
            "mysql://{}:{}/{}",
            self.opts.ip_or_hostname(),
            self.opts.tcp_port(),
            self.opts.db_name().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_both_dsn_forms() {
        let conn = MySqlConnection::new("root:pw@tcp(db.local:3307)/app").unwrap();
        assert_eq!(conn.describe(), "mysql://db.local:3307/app");
        assert!(!conn.is_open());

        let conn = MySqlConnection::new("mysql://root:pw@db.local:3306/app").unwrap();
        assert_eq!(conn.describe(), "mysql://db.local:3306/app");
    }

    #[tokio::test]
    async fn test_operations_require_open_connection() {
        let mut conn = MySqlConnection::new("mysql://root@localhost:3306/app").unwrap();
        assert!(matches!(conn.execute("SELECT 1", &[]).await, Err(DbError::NotOpen)));
        assert!(matches!(conn.query("SELECT 1", &[]).await, Err(DbError::NotOpen)));
        // closing a connection that was never opened is a no-op
        assert!(conn.close().await.is_ok());
    }
}
