use crate::{
    connectors::ConnectionFactory,
    error::CopyError,
    execution::report::{DatasetOutcome, DatasetReport},
};
use engine_config::settings::{Dataset, DatasetIssue};
use engine_core::{
    connectors::sink::{DatabaseSink, FileSink, Sink},
    metrics::Metrics,
};
use engine_processing::{
    consumer::{ProcessorSettings, RowsProcessor},
    producer::{DataReader, Renewal},
};
use planner::query::pagination::Pagination;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};

/// Copies one dataset: first into `<output_dir>/<table>.sql`, then into
/// the destination database, depending on its copy targets.
pub struct DatasetPipeline {
    dataset: Dataset,
    factory: Arc<dyn ConnectionFactory>,
    output_dir: PathBuf,
    metrics: Metrics,
}

impl DatasetPipeline {
    pub fn new(
        dataset: Dataset,
        factory: Arc<dyn ConnectionFactory>,
        output_dir: PathBuf,
        metrics: Metrics,
    ) -> Self {
        Self {
            dataset,
            factory,
            output_dir,
            metrics,
        }
    }

    pub fn label(&self) -> String {
        self.dataset.label().to_string()
    }

    /// Runs the dataset and turns every failure into an outcome, so one
    /// broken dataset never stops the others.
    pub async fn run(self) -> DatasetReport {
        let label = self.label();
        let outcome = match self.prepare() {
            Ok(pagination) => match self.copy(pagination).await {
                Ok(rows) => {
                    info!(rows, "Dataset completed");
                    DatasetOutcome::Completed { rows }
                }
                Err(e) => {
                    error!(error = %e, "Dataset failed");
                    DatasetOutcome::Failed(e.to_string())
                }
            },
            Err(reason) => DatasetOutcome::Skipped(reason),
        };
        DatasetReport { label, outcome }
    }

    /// Checks the dataset can run and builds its pagination strategy.
    fn prepare(&self) -> Result<Pagination, String> {
        let ds = &self.dataset;
        match ds.check() {
            Ok(()) => {}
            Err(DatasetIssue::Disabled) => {
                warn!("Dataset is disabled, skipping");
                return Err(DatasetIssue::Disabled.to_string());
            }
            Err(issue) => {
                error!(issue = %issue, "Dataset is misconfigured, skipping");
                return Err(issue.to_string());
            }
        }

        Pagination::from_kind(ds.pagination, &ds.query, &ds.params).map_err(|e| {
            error!(error = %e, "Invalid pagination parameters, skipping");
            e.to_string()
        })
    }

    async fn copy(&self, pagination: Pagination) -> Result<u64, CopyError> {
        let targets = self.dataset.targets;
        if !targets.file && !targets.db {
            warn!("Dataset has no copy target");
            return Ok(0);
        }

        let mut rows = 0;
        if targets.file {
            rows = self.copy_to_file(pagination.clone()).await?;
        }
        if targets.db {
            rows = self.copy_to_db(pagination).await?;
        }
        Ok(rows)
    }

    async fn copy_to_file(&self, pagination: Pagination) -> Result<u64, CopyError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(CopyError::OutputDir)?;
        let path = self.output_dir.join(format!("{}.sql", self.dataset.table));

        info!(path = %path.display(), "Copying to file");
        let mut sink = FileSink::create(&path).await?;
        let mut reader = self.reader(pagination)?;
        let summary = self.processor().run(&mut reader, &mut sink).await?;
        Ok(summary.rows)
    }

    async fn copy_to_db(&self, pagination: Pagination) -> Result<u64, CopyError> {
        let mut sink = DatabaseSink::new(self.factory.destination()?, &self.dataset.table);
        info!(destination = %sink.describe(), "Copying to database");

        sink.open().await?;
        let copied = self.load(&mut sink, pagination).await;
        let closed = sink.close().await;
        let rows = copied?;
        closed?;
        Ok(rows)
    }

    async fn load(&self, sink: &mut DatabaseSink, pagination: Pagination) -> Result<u64, CopyError> {
        sink.ping().await?;
        sink.run_script(&self.dataset.on_session_start).await?;

        let mut reader = self.reader(pagination)?;
        let summary = self.processor().run(&mut reader, sink).await?;

        sink.run_script(&self.dataset.on_session_end).await?;
        Ok(summary.rows)
    }

    fn reader(&self, pagination: Pagination) -> Result<DataReader, CopyError> {
        let renewal = Renewal::from_settings(
            self.dataset.execution_time,
            self.dataset.reset_connection,
        );
        Ok(DataReader::new(self.factory.source()?, pagination)
            .with_renewal(renewal)
            .with_metrics(self.metrics.clone()))
    }

    fn processor(&self) -> RowsProcessor {
        let settings = ProcessorSettings {
            insert_command: self.dataset.insert_command.clone(),
            table: self.dataset.table.clone(),
            rows_per_command: self.dataset.rows_per_command,
            mode: self.dataset.statement,
        };
        RowsProcessor::new(settings, self.metrics.clone())
    }
}
