//! Circuit breaker registry keyed by a node-supplied tag (spec §5).
//!
//! The breaker only *decides whether to call* the node body; it never
//! wraps a second invocation around the one the caller already performed
//! (§9's explicit correction of the source's double-invocation bug).

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct Breaker {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Registry of per-tag circuit breakers.
///
/// Closed → Open at `failure_threshold` consecutive failures. Open →
/// HalfOpen after `recovery_timeout` has elapsed. HalfOpen success closes
/// the breaker; HalfOpen failure re-opens it.
pub struct CircuitBreakerRegistry {
    failure_threshold: u32,
    recovery_timeout: Duration,
    breakers: Mutex<FxHashMap<String, Breaker>>,
}

impl CircuitBreakerRegistry {
    #[must_use]
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            breakers: Mutex::new(FxHashMap::default()),
        })
    }

    /// Returns whether a call for `tag` is currently permitted. An Open
    /// breaker whose recovery timeout has elapsed transitions to HalfOpen
    /// and permits exactly one trial call.
    #[must_use]
    pub fn allow(&self, tag: &str) -> bool {
        let mut breakers = self.breakers.lock();
        let breaker = breakers.entry(tag.to_string()).or_insert(Breaker {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        });
        match breaker.state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = breaker.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.recovery_timeout {
                    breaker.state = BreakerState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self, tag: &str) {
        let mut breakers = self.breakers.lock();
        if let Some(breaker) = breakers.get_mut(tag) {
            breaker.state = BreakerState::Closed;
            breaker.consecutive_failures = 0;
            breaker.opened_at = None;
        }
    }

    pub fn record_failure(&self, tag: &str) {
        let mut breakers = self.breakers.lock();
        let breaker = breakers.entry(tag.to_string()).or_insert(Breaker {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        });
        match breaker.state {
            BreakerState::HalfOpen => {
                breaker.state = BreakerState::Open;
                breaker.opened_at = Some(Instant::now());
            }
            BreakerState::Closed => {
                breaker.consecutive_failures += 1;
                if breaker.consecutive_failures >= self.failure_threshold {
                    breaker.state = BreakerState::Open;
                    breaker.opened_at = Some(Instant::now());
                }
            }
            BreakerState::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_consecutive_failures() {
        let registry = CircuitBreakerRegistry::new(2, Duration::from_millis(50));
        assert!(registry.allow("llm"));
        registry.record_failure("llm");
        assert!(registry.allow("llm"));
        registry.record_failure("llm");
        assert!(!registry.allow("llm"));
    }

    #[test]
    fn half_open_success_closes_breaker() {
        let registry = CircuitBreakerRegistry::new(1, Duration::from_millis(10));
        registry.record_failure("llm");
        assert!(!registry.allow("llm"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(registry.allow("llm")); // transitions to half-open
        registry.record_success("llm");
        assert!(registry.allow("llm"));
    }

    #[test]
    fn half_open_failure_reopens() {
        let registry = CircuitBreakerRegistry::new(1, Duration::from_millis(10));
        registry.record_failure("llm");
        std::thread::sleep(Duration::from_millis(20));
        assert!(registry.allow("llm"));
        registry.record_failure("llm");
        assert!(!registry.allow("llm"));
    }
}
