use engine_core::metrics::MetricsSnapshot;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOutcome {
    Completed { rows: u64 },
    Failed(String),
    Skipped(String),
}

impl DatasetOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DatasetOutcome::Failed(_))
    }
}

impl fmt::Display for DatasetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetOutcome::Completed { rows } => write!(f, "completed ({rows} rows)"),
            DatasetOutcome::Failed(error) => write!(f, "failed: {error}"),
            DatasetOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    pub label: String,
    pub outcome: DatasetOutcome,
}

/// Outcome of every dataset, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub datasets: Vec<DatasetReport>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.datasets.iter().any(|d| d.outcome.is_failure())
    }

    pub fn count(&self, pred: impl Fn(&DatasetOutcome) -> bool) -> usize {
        self.datasets.iter().filter(|d| pred(&d.outcome)).count()
    }
}
