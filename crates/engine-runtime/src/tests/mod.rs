use crate::{
    connectors::ConnectionFactory,
    execution::{executor, report::DatasetOutcome},
};
use connectors::{
    error::AdapterError,
    memory::{MemoryConnection, MemoryLog, MemoryTable},
    sql::base::connection::Connection,
};
use engine_config::settings::{CopyConfig, DatasetConfig, MainConfig};
use std::{path::Path, sync::Arc};

struct MemoryFactory {
    table: Arc<MemoryTable>,
    source_log: MemoryLog,
    dest_log: MemoryLog,
    fail_source_query: Option<&'static str>,
    fail_dest_execute: Option<&'static str>,
}

impl MemoryFactory {
    fn new(table: MemoryTable) -> Self {
        Self {
            table: Arc::new(table),
            source_log: MemoryLog::new(),
            dest_log: MemoryLog::new(),
            fail_source_query: None,
            fail_dest_execute: None,
        }
    }
}

impl ConnectionFactory for MemoryFactory {
    fn source(&self) -> Result<Box<dyn Connection>, AdapterError> {
        let mut conn = MemoryConnection::shared(self.table.clone())
            .named("source")
            .with_log(self.source_log.clone());
        if let Some(pattern) = self.fail_source_query {
            conn = conn.failing_query(pattern);
        }
        Ok(Box::new(conn))
    }

    fn destination(&self) -> Result<Box<dyn Connection>, AdapterError> {
        let mut conn = MemoryConnection::empty()
            .named("dest")
            .with_log(self.dest_log.clone());
        if let Some(pattern) = self.fail_dest_execute {
            conn = conn.failing_execute(pattern);
        }
        Ok(Box::new(conn))
    }
}

fn config(output_dir: &Path, datasets: Vec<DatasetConfig>) -> CopyConfig {
    CopyConfig {
        config: MainConfig {
            output_dir: Some(output_dir.to_path_buf()),
            ..Default::default()
        },
        datasets,
        ..Default::default()
    }
}

fn dataset(table: &str, copy_to: &str) -> DatasetConfig {
    DatasetConfig {
        query: "SELECT id FROM items".into(),
        table: table.into(),
        enabled: true,
        copy_to: Some(copy_to.into()),
        query_type: Some("limitoffset".into()),
        limit: Some(2),
        rows: Some(2),
        ..Default::default()
    }
}

fn executed_sql(log: &MemoryLog) -> Vec<String> {
    log.executed().into_iter().map(|(sql, _)| sql).collect()
}

#[tokio::test]
async fn test_copies_to_file_then_database() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(MemoryFactory::new(MemoryTable::with_ids("id", 1..=3)));
    let config = config(
        dir.path(),
        vec![DatasetConfig {
            on_insert_session_start: "SET FOREIGN_KEY_CHECKS=0;".into(),
            on_insert_session_end: "SET FOREIGN_KEY_CHECKS=1;".into(),
            ..dataset("", "file,db")
        }],
    );

    let report = executor::run(&config, factory.clone(), false).await;

    assert_eq!(report.datasets.len(), 1);
    assert_eq!(report.datasets[0].label, "items");
    assert_eq!(report.datasets[0].outcome, DatasetOutcome::Completed { rows: 3 });
    assert!(!report.has_failures());

    let content = std::fs::read_to_string(dir.path().join("items.sql")).unwrap();
    assert_eq!(
        content,
        "INSERT INTO items (`id`) VALUES (1), (2);\nINSERT INTO items (`id`) VALUES (3);\n"
    );
    assert_eq!(
        executed_sql(&factory.dest_log),
        vec![
            "SET FOREIGN_KEY_CHECKS=0",
            "INSERT INTO items (`id`) VALUES (1), (2);",
            "INSERT INTO items (`id`) VALUES (3);",
            "SET FOREIGN_KEY_CHECKS=1",
        ]
    );

    // each phase reads the source through its own connection
    assert_eq!(factory.source_log.opens(), 2);
    assert_eq!(factory.source_log.closes(), 2);
    assert_eq!(factory.source_log.queries().len(), 6);
    assert_eq!(factory.dest_log.closes(), 1);

    assert_eq!(report.metrics.rows_copied, 6);
    assert_eq!(report.metrics.batches_flushed, 4);
}

#[tokio::test]
async fn test_unrunnable_datasets_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(MemoryFactory::new(MemoryTable::with_ids("id", 1..=3)));
    let config = config(
        dir.path(),
        vec![
            DatasetConfig {
                enabled: false,
                ..dataset("items", "db")
            },
            DatasetConfig {
                query: String::new(),
                ..dataset("", "db")
            },
            DatasetConfig {
                query: "  ".into(),
                ..dataset("items", "db")
            },
            DatasetConfig {
                query_type: Some("between".into()),
                ..dataset("items", "db")
            },
        ],
    );

    let report = executor::run(&config, factory.clone(), false).await;

    let outcomes: Vec<_> = report.datasets.iter().map(|d| d.outcome.clone()).collect();
    assert_eq!(
        outcomes[..3],
        [
            DatasetOutcome::Skipped("dataset is disabled".into()),
            DatasetOutcome::Skipped("table name is empty".into()),
            DatasetOutcome::Skipped("query is empty".into()),
        ]
    );
    assert!(matches!(&outcomes[3], DatasetOutcome::Skipped(reason) if reason.contains("start")));
    assert!(!report.has_failures());
    assert!(factory.source_log.queries().is_empty());
    assert_eq!(factory.dest_log.opens(), 0);
}

#[tokio::test]
async fn test_failure_does_not_stop_other_datasets() {
    let dir = tempfile::tempdir().unwrap();
    let mut factory = MemoryFactory::new(MemoryTable::with_ids("id", 1..=3));
    factory.fail_dest_execute = Some("broken");
    let factory = Arc::new(factory);
    let config = config(
        dir.path(),
        vec![dataset("broken", "db"), dataset("healthy", "db")],
    );

    let report = executor::run(&config, factory.clone(), false).await;

    assert!(report.has_failures());
    assert!(matches!(&report.datasets[0].outcome, DatasetOutcome::Failed(e) if e.contains("broken")));
    assert_eq!(report.datasets[1].outcome, DatasetOutcome::Completed { rows: 3 });
    assert_eq!(
        executed_sql(&factory.dest_log),
        vec![
            "INSERT INTO healthy (`id`) VALUES (1), (2);",
            "INSERT INTO healthy (`id`) VALUES (3);",
        ]
    );
    // the failed dataset released its connections
    assert_eq!(factory.dest_log.opens(), 2);
    assert_eq!(factory.dest_log.closes(), 2);
    assert_eq!(factory.source_log.opens(), factory.source_log.closes());
}

#[tokio::test]
async fn test_file_failure_skips_database_phase() {
    let dir = tempfile::tempdir().unwrap();
    let mut factory = MemoryFactory::new(MemoryTable::with_ids("id", 1..=3));
    factory.fail_source_query = Some("OFFSET 2");
    let factory = Arc::new(factory);
    let config = config(dir.path(), vec![dataset("items", "file,db")]);

    let report = executor::run(&config, factory.clone(), false).await;

    assert!(matches!(&report.datasets[0].outcome, DatasetOutcome::Failed(e) if e.contains("OFFSET 2")));
    assert_eq!(factory.dest_log.opens(), 0);
    assert_eq!(factory.source_log.closes(), 1);
    // the batch flushed before the failure stays in the file
    let content = std::fs::read_to_string(dir.path().join("items.sql")).unwrap();
    assert_eq!(content, "INSERT INTO items (`id`) VALUES (1), (2);\n");
}

#[tokio::test]
async fn test_concurrent_run_keeps_config_order() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(MemoryFactory::new(MemoryTable::with_ids("id", 1..=3)));
    let tables = ["a", "b", "c"];
    let config = config(
        dir.path(),
        tables.iter().map(|t| dataset(t, "db")).collect(),
    );

    let report = executor::run(&config, factory.clone(), true).await;

    let labels: Vec<&str> = report.datasets.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, tables);
    assert!(
        report
            .datasets
            .iter()
            .all(|d| d.outcome == DatasetOutcome::Completed { rows: 3 })
    );

    let mut executed = executed_sql(&factory.dest_log);
    executed.sort();
    assert_eq!(executed.len(), 6);
    assert_eq!(executed[0], "INSERT INTO a (`id`) VALUES (1), (2);");
    assert_eq!(report.metrics.rows_copied, 9);
}
