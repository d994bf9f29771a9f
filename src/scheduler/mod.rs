//! The parallel executor and its supporting policies (spec §4.2, §5):
//! concurrency-bounded scheduling, cooperative cancellation, retry with
//! backoff, and per-tag circuit breaking.

pub mod cancellation;
pub mod circuit_breaker;
pub mod executor;
pub mod retry;

pub use circuit_breaker::CircuitBreakerRegistry;
pub use executor::{ExecutionRequest, Executor, ExecutorOptions};
pub use retry::RetryPolicy;
