use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct Counters {
    docs_seen: AtomicU64,
    ops_queued: AtomicU64,
    batches_flushed: AtomicU64,
    transform_failures: AtomicU64,
    write_failures: AtomicU64,
    conflict_retries: AtomicU64,
}

/// Cheap cloneable counters for one job run.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMetricsSnapshot {
    pub docs_seen: u64,
    pub ops_queued: u64,
    pub batches_flushed: u64,
    pub transform_failures: u64,
    pub write_failures: u64,
    pub conflict_retries: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_docs_seen(&self, count: u64) {
        self.inner.docs_seen.fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_ops_queued(&self, count: u64) {
        self.inner.ops_queued.fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_batches_flushed(&self, count: u64) {
        self.inner.batches_flushed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_transform_failures(&self, count: u64) {
        self.inner
            .transform_failures
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_write_failures(&self, count: u64) {
        self.inner.write_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_conflict_retries(&self, count: u64) {
        self.inner
            .conflict_retries
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunMetricsSnapshot {
        RunMetricsSnapshot {
            docs_seen: self.inner.docs_seen.load(Ordering::Relaxed),
            ops_queued: self.inner.ops_queued.load(Ordering::Relaxed),
            batches_flushed: self.inner.batches_flushed.load(Ordering::Relaxed),
            transform_failures: self.inner.transform_failures.load(Ordering::Relaxed),
            write_failures: self.inner.write_failures.load(Ordering::Relaxed),
            conflict_retries: self.inner.conflict_retries.load(Ordering::Relaxed),
        }
    }
}
