use crate::{
    connectors::ConnectionFactory,
    execution::{
        pipeline::DatasetPipeline,
        report::{DatasetOutcome, DatasetReport, RunReport},
    },
};
use engine_config::settings::CopyConfig;
use engine_core::metrics::Metrics;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};

/// Copies every dataset of `config`.
///
/// Datasets run one after the other in configuration order, or as
/// independent tasks when `concurrent` is set. Either way each dataset
/// owns its connections and a failure only affects its own outcome.
pub async fn run(
    config: &CopyConfig,
    factory: Arc<dyn ConnectionFactory>,
    concurrent: bool,
) -> RunReport {
    let metrics = Metrics::new();
    let output_dir = config.output_dir();
    let pipelines: Vec<_> = config
        .datasets()
        .into_iter()
        .map(|dataset| {
            let span = info_span!("dataset", table = %dataset.table);
            let pipeline =
                DatasetPipeline::new(dataset, factory.clone(), output_dir.clone(), metrics.clone());
            (pipeline, span)
        })
        .collect();

    info!(datasets = pipelines.len(), concurrent, "Starting copy");

    let datasets = if concurrent {
        let tasks = pipelines.into_iter().map(|(pipeline, span)| {
            let label = pipeline.label();
            let handle = tokio::spawn(pipeline.run().instrument(span));
            async move {
                handle.await.unwrap_or_else(|e| DatasetReport {
                    label,
                    outcome: DatasetOutcome::Failed(format!("dataset task failed: {e}")),
                })
            }
        });
        join_all(tasks).await
    } else {
        let mut reports = Vec::with_capacity(pipelines.len());
        for (pipeline, span) in pipelines {
            reports.push(pipeline.run().instrument(span).await);
        }
        reports
    };

    let report = RunReport {
        datasets,
        metrics: metrics.snapshot(),
    };

    for dataset in &report.datasets {
        info!(dataset = %dataset.label, outcome = %dataset.outcome, "Dataset outcome");
    }
    info!(
        completed = report.count(|o| matches!(o, DatasetOutcome::Completed { .. })),
        failed = report.count(DatasetOutcome::is_failure),
        skipped = report.count(|o| matches!(o, DatasetOutcome::Skipped(_))),
        rows = report.metrics.rows_copied,
        batches = report.metrics.batches_flushed,
        bytes = report.metrics.bytes_written,
        reconnects = report.metrics.reconnects,
        "Copy finished"
    );
    report
}
