use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility of one control loop.
#[derive(Clone, Default)]
pub struct ReconcileCounters {
    pub reconciles: Arc<AtomicU64>,

    // terminal short-circuits
    pub not_found: Arc<AtomicU64>,
    pub deleting: Arc<AtomicU64>,

    // mutations
    pub creates: Arc<AtomicU64>,
    pub status_updates: Arc<AtomicU64>,

    pub converged: Arc<AtomicU64>,
    pub failures: Arc<AtomicU64>,

    /// Spans started as new roots because the stored trace context was unusable.
    pub trace_fallbacks: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub reconciles: u64,
    pub not_found: u64,
    pub deleting: u64,
    pub creates: u64,
    pub status_updates: u64,
    pub converged: u64,
    pub failures: u64,
    pub trace_fallbacks: u64,
}

impl ReconcileCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            reconciles: load(&self.reconciles),
            not_found: load(&self.not_found),
            deleting: load(&self.deleting),
            creates: load(&self.creates),
            status_updates: load(&self.status_updates),
            converged: load(&self.converged),
            failures: load(&self.failures),
            trace_fallbacks: load(&self.trace_fallbacks),
        }
    }
}

impl CountersSnapshot {
    /// Number of writes issued against the cluster.
    pub fn mutations(&self) -> u64 {
        self.creates + self.status_updates
    }
}
