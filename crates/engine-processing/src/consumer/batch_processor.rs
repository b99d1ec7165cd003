use crate::{error::ProcessorError, producer::reader::DataReader};
use engine_core::{connectors::sink::Sink, metrics::Metrics};
use model::records::{batch::InsertBatch, statement::StatementMode};
use planner::query::{dialect::MySql, formatter::insert_values, insert::InsertTemplate};
use tracing::info;

pub const DEFAULT_ROWS_PER_COMMAND: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorSettings {
    /// Statement prefix, e.g. `INSERT INTO` or `INSERT IGNORE INTO`.
    pub insert_command: String,
    pub table: String,
    pub rows_per_command: usize,
    pub mode: StatementMode,
}

impl ProcessorSettings {
    pub fn new(table: &str) -> Self {
        Self {
            insert_command: "INSERT INTO".to_string(),
            table: table.to_string(),
            rows_per_command: DEFAULT_ROWS_PER_COMMAND,
            mode: StatementMode::Raw,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub rows: u64,
    pub batches: u64,
}

/// Turns the rows of a [`DataReader`] into multi-row INSERT statements
/// and hands each complete statement to a [`Sink`].
pub struct RowsProcessor {
    settings: ProcessorSettings,
    metrics: Metrics,
}

impl RowsProcessor {
    pub fn new(settings: ProcessorSettings, metrics: Metrics) -> Self {
        Self { settings, metrics }
    }

    /// Copies every row of `reader` into `sink`.
    ///
    /// The reader is closed when this returns, whatever the outcome.
    /// Batches flushed before a failure stay written.
    pub async fn run(
        &self,
        reader: &mut DataReader,
        sink: &mut dyn Sink,
    ) -> Result<ProcessSummary, ProcessorError> {
        let copied = self.copy(reader, sink).await;
        let closed = reader.close().await;
        let summary = copied?;
        closed?;
        Ok(summary)
    }

    async fn copy(
        &self,
        reader: &mut DataReader,
        sink: &mut dyn Sink,
    ) -> Result<ProcessSummary, ProcessorError> {
        let table = self.settings.table.as_str();
        let rows_per_command = self.settings.rows_per_command.max(1);
        let mut summary = ProcessSummary::default();
        let mut template: Option<InsertTemplate> = None;
        let mut batch = InsertBatch::new();

        reader.open().await?;

        while reader.advance().await? {
            let values = reader.scan()?.into_values();
            let template = template.get_or_insert_with(|| {
                InsertTemplate::new(&self.settings.insert_command, table, reader.columns(), &MySql)
            });

            let rendered = insert_values(self.settings.mode, &values);
            let fragment = if batch.is_empty() {
                template.opening(&rendered)
            } else {
                InsertTemplate::continuation(&rendered)
            };
            let params = if self.settings.mode.is_prepared() {
                values
            } else {
                Vec::new()
            };
            batch.push_row(fragment, params);
            summary.rows += 1;

            if batch.rows >= rows_per_command {
                self.flush(&mut batch, sink).await?;
                summary.batches += 1;
                info!(table, rows = summary.rows, "Rows copied");
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, sink).await?;
            summary.batches += 1;
        }

        info!(
            table,
            rows = summary.rows,
            batches = summary.batches,
            sink = %sink.describe(),
            "Copy finished"
        );
        Ok(summary)
    }

    async fn flush(&self, batch: &mut InsertBatch, sink: &mut dyn Sink) -> Result<(), ProcessorError> {
        batch.terminate();
        sink.write(&batch.fragments, &batch.params)
            .await
            .map_err(|source| ProcessorError::Sink {
                sink: sink.describe(),
                source,
            })?;

        let bytes: usize = batch.fragments.iter().map(String::len).sum();
        self.metrics.increment_rows(batch.rows as u64);
        self.metrics.increment_bytes(bytes as u64);
        self.metrics.increment_batches(1);

        batch.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReaderError;
    use async_trait::async_trait;
    use connectors::memory::{MemoryConnection, MemoryLog, MemoryTable};
    use engine_core::{
        connectors::sink::{DatabaseSink, FileSink},
        error::SinkError,
    };
    use model::{
        core::value::Value,
        pagination::{kind::PaginationKind, params::ParamValue},
    };
    use planner::query::pagination::Pagination;
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSink {
        statements: Vec<(String, Vec<Value>)>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl Sink for RecordingSink {
        async fn write(&mut self, fragments: &[String], params: &[Value]) -> Result<(), SinkError> {
            if self.fail_after == Some(self.statements.len()) {
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            self.statements.push((fragments.concat(), params.to_vec()));
            Ok(())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn reader_over(table: MemoryTable, log: &MemoryLog) -> DataReader {
        let conn = MemoryConnection::new(table).with_log(log.clone());
        let pagination = Pagination::from_kind(
            PaginationKind::LimitOffset,
            "SELECT id FROM t",
            &HashMap::from([("limit".to_string(), ParamValue::Int(2))]),
        )
        .unwrap();
        DataReader::new(Box::new(conn), pagination)
    }

    fn settings(rows_per_command: usize, mode: StatementMode) -> ProcessorSettings {
        ProcessorSettings {
            rows_per_command,
            mode,
            ..ProcessorSettings::new("t")
        }
    }

    #[tokio::test]
    async fn test_raw_batches() {
        let log = MemoryLog::new();
        let mut reader = reader_over(MemoryTable::with_ids("id", 1..=3), &log);
        let mut sink = RecordingSink::default();
        let metrics = Metrics::new();

        let summary = RowsProcessor::new(settings(2, StatementMode::Raw), metrics.clone())
            .run(&mut reader, &mut sink)
            .await
            .unwrap();

        assert_eq!(summary, ProcessSummary { rows: 3, batches: 2 });
        let statements: Vec<&str> = sink.statements.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t (`id`) VALUES (1), (2);",
                "INSERT INTO t (`id`) VALUES (3);",
            ]
        );
        assert!(sink.statements.iter().all(|(_, params)| params.is_empty()));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rows_copied, 3);
        assert_eq!(snapshot.batches_flushed, 2);
        assert_eq!(
            snapshot.bytes_written as usize,
            statements.iter().map(|s| s.len()).sum::<usize>()
        );
    }

    #[tokio::test]
    async fn test_prepared_batches() {
        let log = MemoryLog::new();
        let mut reader = reader_over(MemoryTable::with_ids("id", 1..=3), &log);
        let mut sink = RecordingSink::default();

        RowsProcessor::new(settings(2, StatementMode::Prepared), Metrics::new())
            .run(&mut reader, &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.statements,
            vec![
                (
                    "INSERT INTO t (`id`) VALUES (?), (?);".to_string(),
                    vec![Value::Int(1), Value::Int(2)]
                ),
                ("INSERT INTO t (`id`) VALUES (?);".to_string(), vec![Value::Int(3)]),
            ]
        );
    }

    #[tokio::test]
    async fn test_batch_size_does_not_change_rows() {
        let expected: Vec<String> = (1..=7).map(|id| format!("({id})")).collect();

        for size in 1..=8 {
            let log = MemoryLog::new();
            let mut reader = reader_over(MemoryTable::with_ids("id", 1..=7), &log);
            let mut sink = RecordingSink::default();

            let summary = RowsProcessor::new(settings(size, StatementMode::Raw), Metrics::new())
                .run(&mut reader, &mut sink)
                .await
                .unwrap();

            assert_eq!(summary.rows, 7);
            assert_eq!(summary.batches as usize, 7usize.div_ceil(size));

            let tuples: Vec<String> = sink
                .statements
                .iter()
                .flat_map(|(sql, _)| {
                    sql.trim_start_matches("INSERT INTO t (`id`) VALUES ")
                        .trim_end_matches(';')
                        .split(", ")
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect();
            assert_eq!(tuples, expected, "batch size {size}");
        }
    }

    #[tokio::test]
    async fn test_empty_source_flushes_nothing() {
        let log = MemoryLog::new();
        let mut reader = reader_over(MemoryTable::new(&["id"], Vec::new()), &log);
        let mut sink = RecordingSink::default();

        let summary = RowsProcessor::new(settings(2, StatementMode::Raw), Metrics::new())
            .run(&mut reader, &mut sink)
            .await
            .unwrap();

        assert_eq!(summary, ProcessSummary::default());
        assert!(sink.statements.is_empty());
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_closes_reader() {
        let log = MemoryLog::new();
        let mut reader = reader_over(MemoryTable::with_ids("id", 1..=5), &log);
        let mut sink = RecordingSink {
            fail_after: Some(1),
            ..Default::default()
        };

        let err = RowsProcessor::new(settings(2, StatementMode::Raw), Metrics::new())
            .run(&mut reader, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessorError::Sink { ref sink, .. } if sink.as_str() == "recording"));
        // the first batch stays delivered
        assert_eq!(sink.statements.len(), 1);
        assert!(!reader.is_open());
        assert_eq!(log.opens(), 1);
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_propagated() {
        let log = MemoryLog::new();
        let conn = MemoryConnection::new(MemoryTable::with_ids("id", 1..=3))
            .with_log(log.clone())
            .failing_query("SELECT");
        let pagination =
            Pagination::from_kind(PaginationKind::Simple, "SELECT id FROM t", &HashMap::new())
                .unwrap();
        let mut reader = DataReader::new(Box::new(conn), pagination);
        let mut sink = RecordingSink::default();

        let err = RowsProcessor::new(settings(2, StatementMode::Raw), Metrics::new())
            .run(&mut reader, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessorError::Reader(ReaderError::Query { .. })));
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test]
    async fn test_database_sink_end_to_end() {
        let table = MemoryTable::new(
            &["id", "name"],
            vec![
                vec![Value::Int(1), Value::String("O'Brien".into())],
                vec![Value::Int(2), Value::Null],
            ],
        );
        let source_log = MemoryLog::new();
        let mut reader = reader_over(table, &source_log);

        let dest_log = MemoryLog::new();
        let mut sink = DatabaseSink::new(
            Box::new(MemoryConnection::empty().with_log(dest_log.clone())),
            "people",
        );
        sink.open().await.unwrap();

        let mut settings = settings(10, StatementMode::Raw);
        settings.table = "people".to_string();
        settings.insert_command = "INSERT IGNORE INTO".to_string();
        RowsProcessor::new(settings, Metrics::new())
            .run(&mut reader, &mut sink)
            .await
            .unwrap();

        assert_eq!(
            dest_log.executed(),
            vec![(
                "INSERT IGNORE INTO people (`id`, `name`) VALUES (1, 'O''Brien'), (2, NULL);"
                    .to_string(),
                Vec::new()
            )]
        );
    }

    #[tokio::test]
    async fn test_file_sink_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.sql");
        let log = MemoryLog::new();
        let mut reader = reader_over(MemoryTable::with_ids("id", 1..=3), &log);
        let mut sink = FileSink::create(&path).await.unwrap();

        RowsProcessor::new(settings(2, StatementMode::Raw), Metrics::new())
            .run(&mut reader, &mut sink)
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            "INSERT INTO t (`id`) VALUES (1), (2);\nINSERT INTO t (`id`) VALUES (3);\n"
        );
    }
}
