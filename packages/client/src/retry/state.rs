//! Per-request retry bookkeeping

use std::time::Duration;

use tokio::time::Instant;

use crate::error::Error;

/// Progress of one request through its retry policy
///
/// Created when the request is dispatched and dropped when it finishes.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    last_error: Option<Error>,
    delays: Vec<Duration>,
    started: Instant,
}

impl RetryState {
    pub(crate) fn new() -> Self {
        Self { attempt: 0, last_error: None, delays: Vec::new(), started: Instant::now() }
    }

    /// Index of the attempt in progress, starting at 0
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempts started so far
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Backoff delays taken, in order
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn record_error(&mut self, error: Error) {
        self.last_error = Some(error);
    }

    pub(crate) fn record_backoff(&mut self, delay: Duration) {
        self.delays.push(delay);
        self.attempt += 1;
    }
}
