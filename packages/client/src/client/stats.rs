//! Per-client request counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Request counters for one [`HttpClient`](super::HttpClient)
///
/// Counted per attempt, so a request retried twice records three requests.
#[derive(Debug)]
pub struct ClientStats {
    requests_total: AtomicU64,
    requests_successful: AtomicU64,
    requests_failed: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    created_at: Instant,
}

/// Point-in-time copy of [`ClientStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatsSnapshot {
    pub requests_total: u64,
    pub requests_successful: u64,
    pub requests_failed: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub uptime: Duration,
}

impl Default for ClientStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_successful: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    pub(crate) fn record_request(&self, bytes: usize) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, bytes: usize) {
        self.requests_successful.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Success rate in `0.0..=1.0`; 1.0 before any request completes
    pub fn success_rate(&self) -> f64 {
        let successful = self.requests_successful.load(Ordering::Relaxed) as f64;
        let failed = self.requests_failed.load(Ordering::Relaxed) as f64;
        let total = successful + failed;
        if total == 0.0 { 1.0 } else { successful / total }
    }

    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_successful: self.requests_successful.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            uptime: self.created_at.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_counts_completed_attempts() {
        let stats = ClientStats::new();
        assert_eq!(stats.success_rate(), 1.0);

        stats.record_request(10);
        stats.record_failure();
        stats.record_request(10);
        stats.record_success(32);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.bytes_sent, 20);
        assert_eq!(snapshot.bytes_received, 32);
        assert_eq!(stats.success_rate(), 0.5);
    }
}
