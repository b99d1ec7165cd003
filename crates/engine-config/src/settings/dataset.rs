use super::{DatasetConfig, DatasetDefaults, table::infer_table_name};
use model::{
    pagination::{
        kind::PaginationKind,
        params::{ParamValue, names},
    },
    records::statement::StatementMode,
};
use planner::query::pagination::limit_offset::DEFAULT_LIMIT;
use std::{collections::HashMap, fmt};

pub const DEFAULT_INSERT_COMMAND: &str = "INSERT INTO";
pub const DEFAULT_ROWS_PER_COMMAND: usize = 1000;
pub const DEFAULT_COPY_TO: &str = "file";

/// Where the rows of a dataset are copied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyTargets {
    pub file: bool,
    pub db: bool,
}

impl CopyTargets {
    /// `copy_to` is free-form: `file`, `db`, `file,db` and `db+file` all work.
    pub fn parse(copy_to: &str) -> Self {
        let copy_to = copy_to.to_ascii_lowercase();
        Self {
            file: copy_to.contains("file"),
            db: copy_to.contains("db"),
        }
    }
}

/// Why a dataset cannot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetIssue {
    Disabled,
    MissingTable,
    MissingQuery,
}

impl fmt::Display for DatasetIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetIssue::Disabled => write!(f, "dataset is disabled"),
            DatasetIssue::MissingTable => write!(f, "table name is empty"),
            DatasetIssue::MissingQuery => write!(f, "query is empty"),
        }
    }
}

/// A dataset with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub description: String,
    pub query: String,
    pub table: String,
    pub enabled: bool,
    pub insert_command: String,
    pub rows_per_command: usize,
    pub targets: CopyTargets,
    pub pagination: PaginationKind,
    pub statement: StatementMode,
    /// Seconds a source session may run before it is renewed; 0 disables it.
    pub execution_time: u64,
    pub reset_connection: bool,
    /// Initial pagination parameters, keyed by parameter name.
    pub params: HashMap<String, ParamValue>,
    pub on_session_start: String,
    pub on_session_end: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Dataset {
    pub fn resolve(raw: &DatasetConfig, defaults: &DatasetDefaults) -> Self {
        let table = match raw.table.trim() {
            "" => infer_table_name(&raw.query).unwrap_or_default(),
            table => table.to_string(),
        };

        let insert_command = non_empty(&raw.insert_command)
            .or(non_empty(&defaults.insert_command))
            .unwrap_or(DEFAULT_INSERT_COMMAND);
        let copy_to = non_empty(&raw.copy_to)
            .or(non_empty(&defaults.copy_to))
            .unwrap_or(DEFAULT_COPY_TO);
        let query_type = non_empty(&raw.query_type)
            .or(non_empty(&defaults.query_type))
            .unwrap_or_default();
        let sql_statement = non_empty(&raw.sql_statement)
            .or(non_empty(&defaults.sql_statement))
            .unwrap_or_default();

        let rows_per_command = raw
            .rows
            .filter(|&rows| rows > 0)
            .or(defaults.rows.filter(|&rows| rows > 0))
            .unwrap_or(DEFAULT_ROWS_PER_COMMAND);
        let execution_time = raw
            .execution_time
            .filter(|&secs| secs > 0)
            .or(defaults.execution_time)
            .unwrap_or(0);

        Self {
            description: raw.description.clone(),
            query: raw.query.clone(),
            table,
            enabled: raw.enabled,
            insert_command: insert_command.to_string(),
            rows_per_command,
            targets: CopyTargets::parse(copy_to),
            pagination: PaginationKind::from_tag(query_type),
            statement: StatementMode::from_tag(sql_statement),
            execution_time,
            reset_connection: raw.reset_connection,
            params: pagination_params(raw, defaults),
            on_session_start: raw.on_insert_session_start.clone(),
            on_session_end: raw.on_insert_session_end.clone(),
        }
    }

    /// Returns the first reason this dataset has to be skipped.
    pub fn check(&self) -> Result<(), DatasetIssue> {
        if !self.enabled {
            Err(DatasetIssue::Disabled)
        } else if self.table.trim().is_empty() {
            Err(DatasetIssue::MissingTable)
        } else if self.query.trim().is_empty() {
            Err(DatasetIssue::MissingQuery)
        } else {
            Ok(())
        }
    }

    /// Label used in logs: the description when there is one.
    pub fn label(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.table
        } else {
            &self.description
        }
    }
}

fn pagination_params(raw: &DatasetConfig, defaults: &DatasetDefaults) -> HashMap<String, ParamValue> {
    let mut params = HashMap::new();
    let mut set = |name: &str, value: Option<ParamValue>| {
        if let Some(value) = value {
            params.insert(name.to_string(), value);
        }
    };

    let limit = raw
        .limit
        .filter(|&limit| limit > 0)
        .or(defaults.limit.filter(|&limit| limit > 0))
        .unwrap_or(DEFAULT_LIMIT);
    set(names::LIMIT, Some(ParamValue::Int(limit as i64)));
    set(names::OFFSET, raw.initial_offset.map(|o| ParamValue::Int(o as i64)));
    set(names::MAX_OFFSET, raw.max_offset.map(|o| ParamValue::Int(o as i64)));
    set(names::ID, raw.initial_id.map(ParamValue::Int));
    set(names::START, raw.start.clone());
    set(names::END, raw.end.clone());
    set(names::STEP, raw.step.clone());
    params
}
