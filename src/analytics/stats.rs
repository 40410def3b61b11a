use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct SubmitStats {
    pub submitted: AtomicU64,
    pub dispatched: AtomicU64,
    pub cancelled: AtomicU64,
    pub rejected: AtomicU64,

    // Time spent waiting for a permit on the last dispatched submission
    pub last_wait_ms: AtomicU64,
}

impl SubmitStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_wait(&self, ms: u64) {
        self.last_wait_ms.store(ms, Ordering::Relaxed);
    }

    pub fn log_stats(&self, refills: u64) {
        let submitted = self.submitted.load(Ordering::Relaxed);
        let dispatched = self.dispatched.load(Ordering::Relaxed);
        let cancelled = self.cancelled.load(Ordering::Relaxed);
        let rejected = self.rejected.load(Ordering::Relaxed);
        let wait = self.last_wait_ms.load(Ordering::Relaxed);

        info!(
            "STATS: Submitted: {} | Dispatched: {} | Cancelled: {} | Rejected: {} | Refills: {} | Last wait {}ms",
            submitted, dispatched, cancelled, rejected, refills, wait
        );
    }
}
