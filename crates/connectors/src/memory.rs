//! In-memory connections for tests.
//!
//! A [`MemoryTable`] answers the handful of query shapes the pagination
//! strategies generate (`LIMIT`/`OFFSET`, comparisons and `BETWEEN` on the
//! first column). Every call is recorded in a shared [`MemoryLog`] so
//! tests can assert on the exact statement sequence.

use crate::sql::base::{
    connection::{Connection, ResultCursor, no_current_row},
    error::DbError,
};
use async_trait::async_trait;
use model::core::{coercion::coerce_integer_or_zero, value::Value};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl MemoryTable {
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// A one-column table holding `ids` in order.
    pub fn with_ids(column: &str, ids: impl IntoIterator<Item = i64>) -> Self {
        let rows = ids.into_iter().map(|id| vec![Value::Int(id)]).collect();
        Self::new(&[column], rows)
    }

    /// Evaluates `sql` against the table.
    pub fn answer(&self, sql: &str) -> Vec<Vec<Value>> {
        let tokens: Vec<&str> = sql
            .split_whitespace()
            .map(|t| t.trim_end_matches(';'))
            .collect();
        let number = |i: usize| tokens.get(i).and_then(|t| t.parse::<i128>().ok());

        let mut rows: Vec<&Vec<Value>> = self.rows.iter().collect();
        let mut limit = None;
        let mut offset = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            match token.to_ascii_uppercase().as_str() {
                ">" => {
                    if let Some(n) = number(i + 1) {
                        rows.retain(|r| first_key(r) > n);
                    }
                }
                ">=" => {
                    if let Some(n) = number(i + 1) {
                        rows.retain(|r| first_key(r) >= n);
                    }
                }
                "<" => {
                    if let Some(n) = number(i + 1) {
                        rows.retain(|r| first_key(r) < n);
                    }
                }
                "<=" => {
                    if let Some(n) = number(i + 1) {
                        rows.retain(|r| first_key(r) <= n);
                    }
                }
                "BETWEEN" => {
                    if let (Some(lo), Some(hi)) = (number(i + 1), number(i + 3)) {
                        rows.retain(|r| (lo..=hi).contains(&first_key(r)));
                    }
                }
                "LIMIT" => limit = number(i + 1).map(|n| n.max(0) as usize),
                "OFFSET" => offset = number(i + 1).map_or(0, |n| n.max(0) as usize),
                _ => {}
            }
        }

        rows.into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

fn first_key(row: &[Value]) -> i128 {
    row.first().map(coerce_integer_or_zero).unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct Journal {
    pub queries: Vec<String>,
    pub executed: Vec<(String, Vec<Value>)>,
    pub opens: usize,
    pub closes: usize,
}

/// Shared record of everything a set of memory connections did.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog(Arc<Mutex<Journal>>);

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Journal> {
        // a panicking test thread must not hide the journal from others
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().executed.clone()
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }
}

pub struct MemoryConnection {
    name: String,
    table: Arc<MemoryTable>,
    log: MemoryLog,
    open: bool,
    fail_query: Option<String>,
    fail_execute: Option<String>,
    fail_open: bool,
}

impl MemoryConnection {
    pub fn new(table: MemoryTable) -> Self {
        Self::shared(Arc::new(table))
    }

    pub fn shared(table: Arc<MemoryTable>) -> Self {
        Self {
            name: "memory".to_string(),
            table,
            log: MemoryLog::new(),
            open: false,
            fail_query: None,
            fail_execute: None,
            fail_open: false,
        }
    }

    /// A connection with no data, for use as a destination.
    pub fn empty() -> Self {
        Self::new(MemoryTable::default())
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_log(mut self, log: MemoryLog) -> Self {
        self.log = log;
        self
    }

    /// Queries containing `pattern` fail.
    pub fn failing_query(mut self, pattern: &str) -> Self {
        self.fail_query = Some(pattern.to_string());
        self
    }

    /// Statements containing `pattern` fail.
    pub fn failing_execute(mut self, pattern: &str) -> Self {
        self.fail_execute = Some(pattern.to_string());
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn log(&self) -> MemoryLog {
        self.log.clone()
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.open { Ok(()) } else { Err(DbError::NotOpen) }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn open(&mut self) -> Result<(), DbError> {
        if self.fail_open {
            return Err(DbError::Unknown(format!("cannot connect to {}", self.name)));
        }
        if !self.open {
            self.open = true;
            self.log.lock().opens += 1;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if self.open {
            self.open = false;
            self.log.lock().closes += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn ping(&mut self) -> Result<(), DbError> {
        self.ensure_open()
    }

    async fn query(&mut self, sql: &str, _args: &[Value]) -> Result<Box<dyn ResultCursor>, DbError> {
        self.ensure_open()?;
        self.log.lock().queries.push(sql.to_string());
        if let Some(pattern) = &self.fail_query
            && sql.contains(pattern.as_str())
        {
            return Err(DbError::Unknown(format!("query rejected: {sql}")));
        }
        let rows = self.table.answer(sql);
        Ok(Box::new(BufferedCursor::new(self.table.columns.clone(), rows)))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        self.ensure_open()?;
        if let Some(pattern) = &self.fail_execute
            && sql.contains(pattern.as_str())
        {
            return Err(DbError::Write(format!("statement rejected: {sql}")));
        }
        self.log
            .lock()
            .executed
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// A cursor over rows that were fully read when the query ran.
#[derive(Debug, Default)]
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl BufferedCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
        }
    }
}

#[async_trait]
impl ResultCursor for BufferedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn advance(&mut self) -> Result<bool, DbError> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn scan(&mut self) -> Result<Vec<Value>, DbError> {
        self.current.take().ok_or_else(no_current_row)
    }
}
