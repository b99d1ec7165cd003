use crate::error::CliError;
use chrono::NaiveDateTime;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

const DEFAULT_FILTER: &str = "info";

/// Inserts a `_YYYYMMDD_HHMMSS` stamp before the extension, so every run
/// writes to its own file: `copy.log` becomes `copy_20250131_235959.log`.
pub fn stamped_log_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let stamp = now.format("%Y%m%d_%H%M%S");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    path.with_file_name(name)
}

/// Installs the global subscriber. Events go to stdout and, when
/// `log_file` is given, to a timestamped copy of that file as well.
/// Returns the path of the file actually written.
pub fn init(log_file: Option<&Path>) -> Result<Option<PathBuf>, CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| CliError::Logging(e.to_string()))?;
        return Ok(None);
    };

    let path = stamped_log_path(log_file, chrono::Local::now().naive_local());
    let file = File::create(&path).map_err(|source| CliError::LogFile {
        path: path.clone(),
        source,
    })?;

    // concurrent datasets share the file; the mutex keeps lines whole
    let writer = std::io::stdout.and(Mutex::new(file));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;
    Ok(Some(path))
}
