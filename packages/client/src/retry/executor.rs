//! Runs an operation under a retry policy
//!
//! Each attempt is bounded by the policy's attempt timeout. Both the attempt
//! and the backoff sleep race the cancellation token, so a cancelled request
//! stops within one scheduler tick whatever it is doing.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::global::GLOBAL_RETRY_STATS;
use super::policy::RetryPolicy;
use super::state::RetryState;
use crate::error::{self, Error};

/// Final result of a request together with its retry history
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, Error>,
    pub state: RetryState,
}

impl<T> RetryOutcome<T> {
    pub fn into_result(self) -> Result<T, Error> {
        self.result
    }
}

/// Retry executor for one request
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, cancel: CancellationToken::new() }
    }

    /// Stop retrying, and abort any attempt in flight, when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails permanently or the policy gives up
    ///
    /// `operation` receives the 0-based attempt index. Errors the policy does
    /// not consider retryable are returned as-is; once the policy returns no
    /// further delay the last error is wrapped in `RetriesExhausted`.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        GLOBAL_RETRY_STATS.record_operation();
        let mut state = RetryState::new();
        let attempt_timeout = self.policy.attempt_timeout();

        loop {
            let attempt = state.attempt();
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(error::cancelled()),
                outcome = tokio::time::timeout(attempt_timeout, operation(attempt)) => {
                    outcome.unwrap_or_else(|_| Err(error::timeout("request attempt", attempt_timeout)))
                }
            };

            let err = match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(target: "tether::retry", attempt, "Request succeeded after retry");
                    }
                    GLOBAL_RETRY_STATS.record_success();
                    return RetryOutcome { result: Ok(value), state };
                }
                Err(err) => err,
            };

            if err.is_cancelled() || !self.policy.is_retryable(&err) {
                GLOBAL_RETRY_STATS.record_failure();
                state.record_error(err.clone());
                return RetryOutcome { result: Err(err), state };
            }

            let Some(delay) = self.policy.next_delay(attempt) else {
                let attempts = state.attempts_made();
                tracing::warn!(target: "tether::retry", attempts, error = %err, "Retries exhausted");
                GLOBAL_RETRY_STATS.record_failure();
                state.record_error(err.clone());
                return RetryOutcome { result: Err(error::retries_exhausted(attempts, err)), state };
            };

            tracing::debug!(
                target: "tether::retry",
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retryable failure, backing off"
            );
            state.record_error(err);
            state.record_backoff(delay);
            GLOBAL_RETRY_STATS.record_retry();

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    GLOBAL_RETRY_STATS.record_failure();
                    return RetryOutcome { result: Err(error::cancelled()), state };
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tls::errors::TlsTrustError;

    #[tokio::test]
    async fn recorded_error_keeps_trust_detail() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let outcome = executor
            .run(|_| async { Err::<(), _>(error::tls_trust(TlsTrustError::EmptyChain)) })
            .await;

        let recorded = outcome.state.last_error().unwrap();
        assert!(matches!(recorded.trust_error(), Some(TlsTrustError::EmptyChain)));
        assert!(outcome.result.unwrap_err().is_tls_trust());
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_error_after_exhaustion_keeps_its_cause() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 1, 1.0).unwrap();
        let outcome = RetryExecutor::new(policy)
            .run(|_| async { Err::<(), _>(error::network(std::io::Error::other("reset"))) })
            .await;

        let recorded = outcome.state.last_error().unwrap();
        assert!(recorded.is_network());
        assert!(std::error::Error::source(recorded).is_some());
        assert_eq!(outcome.result.unwrap_err().attempts(), Some(2));
    }
}
