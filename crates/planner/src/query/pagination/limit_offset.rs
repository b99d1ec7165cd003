use super::{PaginationError, trim_statement_end};
use model::pagination::params::{ParamValue, names};

pub const DEFAULT_LIMIT: u64 = 1000;

/// Appends `LIMIT <limit> OFFSET <offset>;` to the base query.
///
/// Once a configured `max_offset` has been passed every further page is
/// `LIMIT 0 OFFSET 0`, which returns nothing and repeats, so the stream
/// terminates even when the source keeps growing.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitOffset {
    query: String,
    limit: u64,
    initial_offset: u64,
    offset: u64,
    max_offset: Option<u64>,
}

impl LimitOffset {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_LIMIT,
            initial_offset: 0,
            offset: 0,
            max_offset: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn max_offset(&self) -> Option<u64> {
        self.max_offset
    }

    pub fn reset(&mut self) {
        self.offset = self.initial_offset;
    }

    pub(super) fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), PaginationError> {
        match name {
            names::LIMIT => {
                let limit = non_negative(name, &value)?;
                if limit == 0 {
                    return Err(invalid(name, &value));
                }
                self.limit = limit;
            }
            names::OFFSET => {
                let offset = non_negative(name, &value)?;
                self.initial_offset = offset;
                self.offset = offset;
            }
            names::MAX_OFFSET => {
                let max = non_negative(name, &value)?;
                self.max_offset = (max > 0).then_some(max);
            }
            _ => {}
        }
        Ok(())
    }

    pub(super) fn next_query_text(&mut self) -> String {
        let base = trim_statement_end(&self.query);

        if let Some(max) = self.max_offset
            && self.offset > max
        {
            return format!("{base} LIMIT 0 OFFSET 0;");
        }

        let query = format!("{base} LIMIT {} OFFSET {};", self.limit, self.offset);
        self.offset = self.offset.saturating_add(self.limit);
        query
    }
}

fn non_negative(name: &str, value: &ParamValue) -> Result<u64, PaginationError> {
    value
        .as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| invalid(name, value))
}

fn invalid(name: &str, value: &ParamValue) -> PaginationError {
    PaginationError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_advance_by_limit() {
        let mut p = LimitOffset::new("SELECT * FROM t ;\n").with_limit(4);
        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 4 OFFSET 0;");
        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 4 OFFSET 4;");
        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 4 OFFSET 8;");
        assert_eq!(p.offset(), 12);
    }

    #[test]
    fn test_default_limit() {
        let mut p = LimitOffset::new("SELECT 1");
        assert_eq!(p.next_query_text(), "SELECT 1 LIMIT 1000 OFFSET 0;");
    }

    #[test]
    fn test_max_offset_produces_empty_page() {
        let mut p = LimitOffset::new("SELECT * FROM t").with_limit(4);
        p.set_parameter("max_offset", ParamValue::Int(4)).unwrap();

        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 4 OFFSET 0;");
        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 4 OFFSET 4;");
        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 0 OFFSET 0;");
        assert_eq!(p.next_query_text(), "SELECT * FROM t LIMIT 0 OFFSET 0;");
        assert_eq!(p.offset(), 8);
    }

    #[test]
    fn test_zero_max_offset_means_unbounded() {
        let mut p = LimitOffset::new("SELECT 1").with_limit(1);
        p.set_parameter("max_offset", ParamValue::Int(0)).unwrap();
        assert_eq!(p.max_offset(), None);
        p.next_query_text();
        p.next_query_text();
        assert_eq!(p.next_query_text(), "SELECT 1 LIMIT 1 OFFSET 2;");
    }

    #[test]
    fn test_reset_restores_initial_offset() {
        let mut p = LimitOffset::new("SELECT 1").with_limit(10);
        p.set_parameter("offset", ParamValue::Text("20".into())).unwrap();
        p.next_query_text();
        p.next_query_text();
        p.reset();
        assert_eq!(p.next_query_text(), "SELECT 1 LIMIT 10 OFFSET 20;");
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut p = LimitOffset::new("SELECT 1");
        assert!(p.set_parameter("limit", ParamValue::Int(0)).is_err());
        assert!(p.set_parameter("offset", ParamValue::Int(-1)).is_err());
        assert!(p.set_parameter("limit", ParamValue::Text("ten".into())).is_err());
        assert!(p.set_parameter("unknown", ParamValue::Int(1)).is_ok());
    }
}
