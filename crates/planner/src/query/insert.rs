use crate::query::dialect::Dialect;

/// The fixed part of a multi-row INSERT: command, target table and the
/// quoted column list, e.g. ``INSERT IGNORE INTO users (`id`, `name`) VALUES``.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertTemplate {
    header: String,
}

impl InsertTemplate {
    pub fn new(command: &str, table: &str, columns: &[String], dialect: &dyn Dialect) -> Self {
        let quoted = columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let header = format!("{} {} ({}) VALUES", command.trim(), table, quoted);
        Self { header }
    }

    /// Fragment opening a new statement with its first tuple.
    pub fn opening(&self, values: &str) -> String {
        format!("{} ({values})", self.header)
    }

    /// Fragment appending another tuple to an open statement.
    pub fn continuation(values: &str) -> String {
        format!(", ({values})")
    }
}
