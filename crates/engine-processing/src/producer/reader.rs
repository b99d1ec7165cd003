use crate::error::ReaderError;
use connectors::sql::base::connection::{Connection, ResultCursor};
use engine_core::metrics::Metrics;
use model::records::row::Row;
use planner::query::pagination::Pagination;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// When the source connection is closed and reopened between pages.
///
/// Long scans over a server that enforces a maximum statement execution
/// time get aborted once the session has been busy for too long. Renewing
/// the session between two pages keeps each query under that limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Renewal {
    #[default]
    Never,
    /// Renew before the next query once the session is older than this.
    After(Duration),
    /// Renew before every query except the first one of a session.
    EveryQuery,
}

impl Renewal {
    pub fn from_settings(execution_time_secs: u64, reset_always: bool) -> Self {
        if reset_always {
            Renewal::EveryQuery
        } else if execution_time_secs > 0 {
            Renewal::After(Duration::from_secs(execution_time_secs))
        } else {
            Renewal::Never
        }
    }
}

/// Streams rows page by page from a source connection.
///
/// The reader executes the pagination strategy's queries one after the
/// other and hands out rows until a page comes back empty. An empty page
/// whose query text repeats the previous one ends the stream. A strategy
/// whose text does not change (a base query without its placeholder) is
/// therefore read exactly once instead of forever.
pub struct DataReader {
    conn: Box<dyn Connection>,
    pagination: Pagination,
    cursor: Option<Box<dyn ResultCursor>>,
    columns: Vec<String>,
    previous_query: Option<String>,
    last_query: Option<String>,
    renewal: Renewal,
    session_start: Option<Instant>,
    opened: bool,
    metrics: Metrics,
}

impl DataReader {
    pub fn new(conn: Box<dyn Connection>, pagination: Pagination) -> Self {
        Self {
            conn,
            pagination,
            cursor: None,
            columns: Vec::new(),
            previous_query: None,
            last_query: None,
            renewal: Renewal::Never,
            session_start: None,
            opened: false,
            metrics: Metrics::new(),
        }
    }

    pub fn with_renewal(mut self, renewal: Renewal) -> Self {
        self.renewal = renewal;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Opens the source connection. Calling it on an open reader does nothing.
    pub async fn open(&mut self) -> Result<(), ReaderError> {
        if self.opened {
            return Ok(());
        }
        self.conn.open().await.map_err(ReaderError::Connection)?;
        self.opened = true;
        debug!(source = %self.conn.describe(), "Data reader opened");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Moves to the next row, fetching new pages as needed.
    ///
    /// Returns `false` once the source is exhausted; the reader is closed
    /// at that point. A closed reader yields no rows.
    pub async fn advance(&mut self) -> Result<bool, ReaderError> {
        if !self.opened {
            return Ok(false);
        }

        if self.cursor.is_none() {
            self.execute_next().await?;
        }
        if self.advance_cursor().await? {
            return Ok(true);
        }

        loop {
            self.execute_next().await?;
            if self.last_query == self.previous_query {
                break;
            }
            if self.advance_cursor().await? {
                return Ok(true);
            }
            // an empty range window says nothing about the next one
            if !self.pagination.skips_empty_pages() {
                break;
            }
        }

        debug!(
            source = %self.conn.describe(),
            last_query = self.last_query.as_deref().unwrap_or_default(),
            "Source exhausted"
        );
        self.close().await?;
        Ok(false)
    }

    /// Takes the current row and lets the pagination strategy track it.
    pub fn scan(&mut self) -> Result<Row, ReaderError> {
        let cursor = self.cursor.as_mut().ok_or(ReaderError::NoRow)?;
        let values = cursor.scan().map_err(ReaderError::Scan)?;
        self.pagination.observe_row(&values);
        Ok(Row::new(values))
    }

    /// Column names of the most recent result set.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Drops the cursor, closes the connection and forgets the session.
    /// Safe to call any number of times.
    pub async fn close(&mut self) -> Result<(), ReaderError> {
        self.cursor = None;
        self.columns.clear();
        self.previous_query = None;
        self.last_query = None;
        self.session_start = None;
        self.pagination.reset();

        if self.opened {
            self.opened = false;
            self.conn.close().await.map_err(ReaderError::Connection)?;
            debug!(source = %self.conn.describe(), "Data reader closed");
        }
        Ok(())
    }

    async fn advance_cursor(&mut self) -> Result<bool, ReaderError> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.advance().await.map_err(ReaderError::Scan),
            None => Ok(false),
        }
    }

    async fn execute_next(&mut self) -> Result<(), ReaderError> {
        self.renew_if_due().await?;

        let sql = self.pagination.next_query_text();
        self.previous_query = self.last_query.replace(sql.clone());
        self.cursor = None;

        debug!(sql = %sql, "Executing page query");
        let cursor = self
            .conn
            .query(&sql, &[])
            .await
            .map_err(|source| ReaderError::Query { sql, source })?;
        self.metrics.increment_queries(1);

        if !cursor.columns().is_empty() {
            self.columns = cursor.columns().to_vec();
        }
        self.cursor = Some(cursor);
        Ok(())
    }

    async fn renew_if_due(&mut self) -> Result<(), ReaderError> {
        let due = match self.renewal {
            Renewal::Never => false,
            Renewal::EveryQuery => self.last_query.is_some(),
            Renewal::After(limit) => match self.session_start {
                Some(start) => start.elapsed() > limit,
                None => {
                    self.session_start = Some(Instant::now());
                    false
                }
            },
        };
        if !due {
            return Ok(());
        }

        self.cursor = None;
        self.conn.close().await.map_err(ReaderError::Connection)?;
        self.conn.open().await.map_err(ReaderError::Connection)?;
        self.session_start = Some(Instant::now());
        self.metrics.increment_reconnects(1);

        info!(source = %self.conn.describe(), "Source connection renewed");
        Ok(())
    }
}
