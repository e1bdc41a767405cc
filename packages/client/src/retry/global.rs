//! Process-wide retry statistics
//!
//! Relaxed atomic counters updated by every [`super::RetryExecutor`] run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters across all requests in the process
pub struct GlobalRetryStats {
    operations: AtomicU64,
    retries: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`GlobalRetryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStatsSnapshot {
    pub operations: u64,
    pub retries: u64,
    pub successes: u64,
    pub failures: u64,
}

impl RetryStatsSnapshot {
    /// Average retries per operation; 0.0 before any operation
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_retries_per_operation(&self) -> f64 {
        if self.operations > 0 { self.retries as f64 / self.operations as f64 } else { 0.0 }
    }
}

impl GlobalRetryStats {
    pub const fn new() -> Self {
        Self {
            operations: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that ended in any error, cancellation included
    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RetryStatsSnapshot {
        RetryStatsSnapshot {
            operations: self.operations.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for GlobalRetryStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics shared by every executor in the process
pub static GLOBAL_RETRY_STATS: GlobalRetryStats = GlobalRetryStats::new();
