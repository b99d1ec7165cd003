use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_copied: AtomicU64,
    bytes_written: AtomicU64,
    batches_flushed: AtomicU64,
    queries_executed: AtomicU64,
    reconnects: AtomicU64,
}

/// Counters for one copy run. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_copied: u64,
    pub bytes_written: u64,
    pub batches_flushed: u64,
    pub queries_executed: u64,
    pub reconnects: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_copied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_bytes(&self, count: u64) {
        self.inner.bytes_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, count: u64) {
        self.inner
            .batches_flushed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_queries(&self, count: u64) {
        self.inner
            .queries_executed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_reconnects(&self, count: u64) {
        self.inner.reconnects.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_copied: self.inner.rows_copied.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
            batches_flushed: self.inner.batches_flushed.load(Ordering::Relaxed),
            queries_executed: self.inner.queries_executed.load(Ordering::Relaxed),
            reconnects: self.inner.reconnects.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
