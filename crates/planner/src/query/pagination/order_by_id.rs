use super::PaginationError;
use model::{
    core::{coercion::coerce_integer, value::Value},
    pagination::params::{ParamValue, names},
};
use tracing::warn;

pub const ID_PLACEHOLDER: &str = "{{id}}";

/// Keyset pagination over an ascending integer column.
///
/// The base query is expected to filter and order by that column and to
/// return it first, e.g.
/// `SELECT id, name FROM t WHERE id > {{id}} ORDER BY id LIMIT 1000`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderById {
    query: String,
    initial_id: i128,
    last_seen: Option<i128>,
}

impl OrderById {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            initial_id: 0,
            last_seen: None,
        }
    }

    /// The id the next page starts after.
    pub fn current_id(&self) -> i128 {
        self.last_seen.unwrap_or(self.initial_id)
    }

    pub fn last_seen_id(&self) -> Option<i128> {
        self.last_seen
    }

    pub fn reset(&mut self) {
        self.last_seen = None;
    }

    pub(super) fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), PaginationError> {
        if name == names::ID {
            self.initial_id = value
                .as_i64()
                .map(i128::from)
                .ok_or_else(|| PaginationError::InvalidParameter {
                    name: name.to_string(),
                    value: value.to_string(),
                })?;
            self.last_seen = None;
        }
        Ok(())
    }

    pub(super) fn next_query_text(&mut self) -> String {
        self.query
            .replace(ID_PLACEHOLDER, &self.current_id().to_string())
    }

    /// Records the driving column of a scanned row. Values that cannot be
    /// read as an integer count as zero.
    pub fn track(&mut self, value: &Value) {
        let id = coerce_integer(value).unwrap_or_else(|| {
            warn!(
                value = %value,
                value_type = value.type_name(),
                "Cursor column is not an integer, using 0"
            );
            0
        });
        self.last_seen = Some(id);
    }
}
