//! Retry policy: bounded, deterministic backoff
//!
//! The policy is a pure function from the failure index to the delay before
//! the next attempt. There is no jitter, so a given policy always produces the
//! same schedule.

use std::time::Duration;

use http::StatusCode;

use crate::config::validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
use crate::error::Error;

/// Per-attempt timeout and first backoff delay
pub const DEFAULT_BASE_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Retries allowed after the first attempt
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.0;
/// Upper bound on any single delay
pub const DEFAULT_CEILING: Duration = Duration::from_secs(120);
/// Hard limit on `max_attempts`
pub const MAX_ATTEMPTS_LIMIT: u32 = 16;

const DEFAULT_TRANSIENT_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    base_timeout: Duration,
    max_attempts: u32,
    backoff_multiplier: f64,
    ceiling: Duration,
    transient_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    /// 30 s timeout, one retry, constant backoff
    fn default() -> Self {
        Self {
            base_timeout: DEFAULT_BASE_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            ceiling: DEFAULT_CEILING,
            transient_statuses: DEFAULT_TRANSIENT_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default 120 s ceiling
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the values fail [`Validator::validate`].
    pub fn new(
        base_timeout: Duration,
        max_attempts: u32,
        backoff_multiplier: f64,
    ) -> ConfigResult<Self> {
        let policy = Self { base_timeout, max_attempts, backoff_multiplier, ..Self::default() };
        policy.validate()?;
        Ok(policy)
    }

    /// Single attempt, never retried
    #[must_use]
    pub fn no_retry() -> Self {
        Self { max_attempts: 0, ..Self::default() }
    }

    /// Replace the delay ceiling
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the ceiling is below the base timeout.
    pub fn with_ceiling(mut self, ceiling: Duration) -> ConfigResult<Self> {
        self.ceiling = ceiling;
        self.validate()?;
        Ok(self)
    }

    /// Replace the set of statuses treated as transient
    #[must_use]
    pub fn with_transient_statuses(mut self, statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        self.transient_statuses = statuses.into_iter().collect();
        self
    }

    pub fn base_timeout(&self) -> Duration {
        self.base_timeout
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Bound on one attempt's connect, handshake and exchange
    pub fn attempt_timeout(&self) -> Duration {
        self.base_timeout
    }

    /// Delay before retrying after failure number `attempt` (0-based)
    ///
    /// `None` once `attempt >= max_attempts`. Otherwise
    /// `min(base_timeout * backoff_multiplier^attempt, ceiling)`, which is
    /// non-decreasing in `attempt` because the multiplier is at least 1.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_timeout.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay = if secs.is_finite() && secs < self.ceiling.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.ceiling
        };
        Some(delay.min(self.ceiling))
    }

    pub fn is_transient_status(&self, status: StatusCode) -> bool {
        self.transient_statuses.contains(&status)
    }

    /// Transport failures always qualify; status errors only when transient
    pub fn is_retryable(&self, error: &Error) -> bool {
        error.is_retryable() || error.status().is_some_and(|s| self.is_transient_status(s))
    }
}

impl Validator for RetryPolicy {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(self.base_timeout, "base_timeout")?;
        ConfigValidator::validate_range(self.max_attempts, 0, MAX_ATTEMPTS_LIMIT, "max_attempts")?;

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigurationError::InvalidParameter(format!(
                "backoff_multiplier must be a finite value >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }

        if self.ceiling < self.base_timeout {
            return Err(ConfigurationError::Conflict(format!(
                "ceiling ({}ms) cannot be below base_timeout ({}ms)",
                self.ceiling.as_millis(),
                self.base_timeout.as_millis()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_one_retry_after_thirty_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(0), Some(Duration::from_millis(30_000)));
        assert_eq!(policy.next_delay(1), None);
        assert_eq!(policy.attempt_timeout(), Duration::from_millis(30_000));
    }

    #[test]
    fn delays_grow_monotonically_up_to_the_ceiling() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 10, 2.0)
            .unwrap()
            .with_ceiling(Duration::from_secs(60))
            .unwrap();

        let delays: Vec<_> = (0..10).map(|a| policy.next_delay(a).unwrap()).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(60)));
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[3], Duration::from_secs(8));
        assert_eq!(delays[9], Duration::from_secs(60));
        assert_eq!(policy.next_delay(10), None);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(RetryPolicy::new(Duration::ZERO, 1, 1.0).is_err());
        assert!(RetryPolicy::new(Duration::from_secs(1), 17, 1.0).is_err());
        assert!(RetryPolicy::new(Duration::from_secs(1), 1, 0.5).is_err());
        assert!(RetryPolicy::new(Duration::from_secs(1), 1, f64::NAN).is_err());
        assert!(
            RetryPolicy::new(Duration::from_secs(10), 1, 1.0)
                .unwrap()
                .with_ceiling(Duration::from_secs(5))
                .is_err()
        );
    }

    #[test]
    fn transient_statuses_are_configurable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!policy.is_transient_status(StatusCode::NOT_FOUND));

        let policy = policy.with_transient_statuses([StatusCode::CONFLICT]);
        assert!(policy.is_transient_status(StatusCode::CONFLICT));
        assert!(!policy.is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn no_retry_never_delays() {
        assert_eq!(RetryPolicy::no_retry().next_delay(0), None);
    }
}
