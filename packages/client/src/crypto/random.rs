//! Random token generation

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rand::distr::Alphanumeric;

/// Boundaries generated so far in this process
static BOUNDARY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Alphanumeric characters from the thread-local CSPRNG
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    rand::rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a boundary string for multipart bodies
///
/// The process-wide counter keeps concurrent calls distinct even if the RNG
/// repeated itself; the random suffix keeps boundaries unguessable across
/// processes.
#[must_use]
pub fn generate_boundary() -> String {
    let sequence = BOUNDARY_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("tether-{sequence:016x}-{}", random_alphanumeric(24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_distinct_and_token_safe() {
        let a = generate_boundary();
        let b = generate_boundary();
        assert_ne!(a, b);
        assert_eq!(a.len(), "tether-".len() + 16 + 1 + 24);
        assert!(a.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-'));
    }
}
