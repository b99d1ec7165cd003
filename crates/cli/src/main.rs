use crate::error::CliError;
use clap::Parser;
use engine_config::settings::{CopyConfig, DEFAULT_CONFIG_PATH};
use engine_runtime::{connectors::AdapterFactory, execution::executor};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};

mod error;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "copysql", version, about = "Copies SQL query results as batched INSERT statements")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Also write the log to this file (a timestamp is added to its name)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Run all datasets concurrently
    #[arg(long, alias = "concurrent")]
    go: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    if let Some(path) = logging::init(cli.log.as_deref())? {
        info!(path = %path.display(), "Logging to file");
    }

    let config = CopyConfig::load(&cli.config)?;
    config.validate()?;
    info!(
        config = %cli.config.display(),
        description = %config.description,
        datasets = config.datasets.len(),
        "Configuration loaded"
    );

    let factory = Arc::new(AdapterFactory::new(
        config.config.source.clone(),
        config.config.dest.clone(),
    ));
    let report = executor::run(&config, factory, cli.go).await;

    let failed = report.count(|o| o.is_failure());
    if failed > 0 {
        error!(failed, "Copy finished with failures");
        return Err(CliError::DatasetsFailed(failed));
    }
    Ok(())
}
