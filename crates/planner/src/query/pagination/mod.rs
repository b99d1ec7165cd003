//! Pagination strategies that turn a base query into a sequence of pages.
//!
//! Each strategy owns its cursor. The row stream asks for the next query
//! text, executes it and feeds scanned rows back through
//! [`Pagination::observe_row`]. None of the strategies decide when paging
//! is over; the stream stops when a page is empty and the generated text
//! repeats the previous one.

use model::{
    core::value::Value,
    pagination::{kind::PaginationKind, params::ParamValue},
};
use thiserror::Error;

pub mod factory;
pub mod limit_offset;
pub mod order_by_id;
pub mod range;

pub use limit_offset::LimitOffset;
pub use order_by_id::OrderById;
pub use range::RangeWindow;

#[derive(Debug, Error, PartialEq)]
pub enum PaginationError {
    #[error("Invalid value for pagination parameter '{name}': {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Missing pagination parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Invalid range bound '{0}': expected an integer or a 'YYYY-MM-DD HH:MM:SS' timestamp")]
    InvalidBound(String),

    #[error("Invalid range step '{step}': {reason}")]
    InvalidStep { step: String, reason: String },
}

/// Strips trailing whitespace and statement terminators.
pub(crate) fn trim_statement_end(query: &str) -> &str {
    query.trim_end_matches([' ', '\t', '\n', '\r', ';'])
}

/// Runs the query once, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Simple {
    query: String,
}

impl Simple {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    Simple(Simple),
    LimitOffset(LimitOffset),
    OrderById(OrderById),
    Range(RangeWindow),
}

impl Pagination {
    pub fn kind(&self) -> PaginationKind {
        match self {
            Pagination::Simple(_) => PaginationKind::Simple,
            Pagination::LimitOffset(_) => PaginationKind::LimitOffset,
            Pagination::OrderById(_) => PaginationKind::OrderById,
            Pagination::Range(_) => PaginationKind::Range,
        }
    }

    /// Returns the cursor to where it was right after construction.
    pub fn reset(&mut self) {
        match self {
            Pagination::Simple(_) => {}
            Pagination::LimitOffset(p) => p.reset(),
            Pagination::OrderById(p) => p.reset(),
            Pagination::Range(p) => p.reset(),
        }
    }

    /// Applies a named parameter. Names are case-insensitive and names a
    /// strategy does not know are ignored.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), PaginationError> {
        let name = name.trim().to_ascii_lowercase();
        match self {
            Pagination::Simple(_) => Ok(()),
            Pagination::LimitOffset(p) => p.set_parameter(&name, value),
            Pagination::OrderById(p) => p.set_parameter(&name, value),
            Pagination::Range(p) => p.set_parameter(&name, value),
        }
    }

    /// Produces the query text for the next page and advances the cursor.
    pub fn next_query_text(&mut self) -> String {
        match self {
            Pagination::Simple(p) => p.query.clone(),
            Pagination::LimitOffset(p) => p.next_query_text(),
            Pagination::OrderById(p) => p.next_query_text(),
            Pagination::Range(p) => p.next_query_text(),
        }
    }

    /// Lets the strategy see a scanned row. Only the order-by-id cursor
    /// reads it: its first column becomes the last seen id.
    pub fn observe_row(&mut self, values: &[Value]) {
        if let Pagination::OrderById(p) = self
            && let Some(first) = values.first()
        {
            p.track(first);
        }
    }

    /// Whether an empty page says nothing about later pages. Range windows
    /// may be empty in the middle of the data, every other strategy is
    /// finished by its first empty page.
    pub fn skips_empty_pages(&self) -> bool {
        matches!(self, Pagination::Range(_))
    }
}
