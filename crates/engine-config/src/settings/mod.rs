//! JSON configuration of a copy run.
//!
//! The file describes one source, one destination and a list of datasets.
//! Dataset fields left out fall back to `config.default_dataset` and then
//! to built-in defaults; [`CopyConfig::datasets`] returns the resolved view.

use crate::error::ConfigError;
use model::pagination::params::ParamValue;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod dataset;
pub mod table;

pub use dataset::{CopyTargets, Dataset, DatasetIssue};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub description: String,
    pub config: MainConfig,
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MainConfig {
    pub description: String,
    pub source: DbConfig,
    pub dest: DbConfig,
    /// Directory receiving the `<table>.sql` files. Defaults to the
    /// working directory.
    pub output_dir: Option<PathBuf>,
    pub default_dataset: DatasetDefaults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub description: String,
    pub driver: String,
    pub dsn: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetDefaults {
    pub description: String,
    pub insert_command: Option<String>,
    pub rows: Option<usize>,
    pub copy_to: Option<String>,
    pub query_type: Option<String>,
    pub sql_statement: Option<String>,
    pub execution_time: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub description: String,
    pub query: String,
    pub table: String,
    pub enabled: bool,
    pub insert_command: Option<String>,
    pub rows: Option<usize>,
    pub copy_to: Option<String>,
    pub query_type: Option<String>,
    pub sql_statement: Option<String>,
    pub execution_time: Option<u64>,
    /// Reopen the source connection before every page query.
    pub reset_connection: bool,
    pub initial_id: Option<i64>,
    pub limit: Option<u64>,
    pub initial_offset: Option<u64>,
    pub max_offset: Option<u64>,
    pub start: Option<ParamValue>,
    pub end: Option<ParamValue>,
    pub step: Option<ParamValue>,
    pub on_insert_session_start: String,
    pub on_insert_session_end: String,
}

impl CopyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            datasets = config.datasets.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Checks the connection settings. Every problem found is reported,
    /// one per line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut messages = Vec::new();
        let checks = [
            (&self.config.source.driver, "source database driver cannot be empty"),
            (&self.config.source.dsn, "source database DSN cannot be empty"),
            (&self.config.dest.driver, "destination database driver cannot be empty"),
            (&self.config.dest.dsn, "destination database DSN cannot be empty"),
        ];
        for (value, message) in checks {
            if value.trim().is_empty() {
                messages.push(message);
            }
        }
        if self.datasets.is_empty() {
            messages.push("no datasets configured");
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(messages.join("\n")))
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Datasets in file order with every default applied.
    pub fn datasets(&self) -> Vec<Dataset> {
        self.datasets
            .iter()
            .map(|raw| Dataset::resolve(raw, &self.config.default_dataset))
            .collect()
    }
}
