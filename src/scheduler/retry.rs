//! Retry policy: exponential backoff around (never inside) a single node
//! invocation (spec §5, §9).

use std::time::Duration;

use crate::errors::NodeFailure;

/// Classifies a node failure as transient (worth retrying) or terminal.
#[must_use]
pub fn is_transient(failure: &NodeFailure) -> bool {
    matches!(failure, NodeFailure::Timeout { .. } | NodeFailure::Transient { .. })
}

/// Exponential backoff retry policy: base 200ms, multiplier 2, up to
/// `max_attempts` total attempts (including the first).
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before the `attempt`-th retry (1-indexed: `attempt = 1` is the
    /// delay before the *second* overall call).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(self.base_delay.as_secs_f64() * factor)
    }

    /// Whether a further attempt is allowed after `attempts_made` calls.
    #[must_use]
    pub fn should_retry(&self, attempts_made: u32, failure: &NodeFailure) -> bool {
        attempts_made < self.max_attempts && is_transient(failure)
    }
}
