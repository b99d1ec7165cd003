//! Row streaming for MySQL result sets.
//!
//! A `mysql_async` result borrows its session, so the session is lent to a
//! task that reads the result and forwards rows through a bounded channel.
//! The task hands the session back through its `JoinHandle` once the
//! result is drained or the cursor is dropped.

use crate::sql::{
    base::{
        connection::{ResultCursor, no_current_row},
        error::DbError,
    },
    mysql::row::{column_names, row_values},
};
use async_trait::async_trait;
use model::core::value::Value;
use mysql_async::{Conn, Params, QueryResult, prelude::*};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::debug;

/// Rows read ahead of the cursor.
pub const STREAM_CAPACITY: usize = 1024;

type RowResult = Result<Vec<Value>, DbError>;

/// Starts `sql` on `conn` in a background task.
///
/// Resolves to the column list once the server accepted the query, or to
/// the query error. Either way the returned handle yields the session back.
pub async fn spawn_query(
    conn: Conn,
    sql: String,
    params: Option<Params>,
) -> (JoinHandle<Conn>, Result<StreamingCursor, DbError>) {
    let (header_tx, header_rx) = oneshot::channel();
    let (rows_tx, rows_rx) = mpsc::channel(STREAM_CAPACITY);
    let task = tokio::spawn(run_query(conn, sql, params, header_tx, rows_tx));

    let cursor = match header_rx.await {
        Ok(Ok(columns)) => Ok(StreamingCursor::new(columns, rows_rx)),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(DbError::Unknown("query task ended before the result".into())),
    };
    (task, cursor)
}

async fn run_query(
    mut conn: Conn,
    sql: String,
    params: Option<Params>,
    header: oneshot::Sender<Result<Vec<String>, DbError>>,
    rows: mpsc::Sender<RowResult>,
) -> Conn {
    // page queries carry no arguments and go through the text protocol
    match params {
        None => match conn.query_iter(sql).await {
            Ok(result) => forward(result, header, rows).await,
            Err(e) => {
                let _ = header.send(Err(e.into()));
            }
        },
        Some(params) => match conn.exec_iter(sql, params).await {
            Ok(result) => forward(result, header, rows).await,
            Err(e) => {
                let _ = header.send(Err(e.into()));
            }
        },
    }
    conn
}

async fn forward<P>(
    mut result: QueryResult<'_, 'static, P>,
    header: oneshot::Sender<Result<Vec<String>, DbError>>,
    rows: mpsc::Sender<RowResult>,
) where
    P: Protocol + Unpin,
{
    let columns = result
        .columns()
        .map(|cols| column_names(&cols))
        .unwrap_or_default();

    if header.send(Ok(columns)).is_ok() {
        loop {
            let item = match result.next().await {
                Ok(Some(row)) => row_values(&row),
                Ok(None) => break,
                Err(e) => Err(e.into()),
            };
            let failed = item.is_err();
            // a closed channel means the cursor was dropped
            if rows.send(item).await.is_err() || failed {
                break;
            }
        }
    }

    if let Err(e) = result.drop_result().await {
        debug!(error = %e, "Discarding the rest of a result set failed");
    }
}

/// Cursor fed by [`spawn_query`].
#[derive(Debug)]
pub struct StreamingCursor {
    columns: Vec<String>,
    rows: mpsc::Receiver<RowResult>,
    current: Option<Vec<Value>>,
}

impl StreamingCursor {
    pub fn new(columns: Vec<String>, rows: mpsc::Receiver<RowResult>) -> Self {
        Self {
            columns,
            rows,
            current: None,
        }
    }
}

#[async_trait]
impl ResultCursor for StreamingCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn advance(&mut self) -> Result<bool, DbError> {
        self.current = None;
        match self.rows.recv().await {
            Some(Ok(row)) => {
                self.current = Some(row);
                Ok(true)
            }
            Some(Err(e)) => Err(e),
            None => Ok(false),
        }
    }

    fn scan(&mut self) -> Result<Vec<Value>, DbError> {
        self.current.take().ok_or_else(no_current_row)
    }
}
