//! Bounded retry with deterministic backoff and cancellation

pub mod executor;
pub mod global;
pub mod policy;
pub mod state;

pub use executor::{RetryExecutor, RetryOutcome};
pub use global::{GLOBAL_RETRY_STATS, GlobalRetryStats, RetryStatsSnapshot};
pub use policy::RetryPolicy;
pub use state::RetryState;
