//! Process-level configuration (spec §6, ambient stack): environment-
//! driven defaults for [`ExecutorOptions`], loaded once via `dotenvy`,
//! mirroring the teacher's `RuntimeConfig::resolve_sqlite_db_name`
//! (`dotenvy::dotenv().ok()` then `std::env::var` with a fallback).

use std::time::Duration;

use crate::scheduler::ExecutorOptions;

/// Default event buffer capacity, mirroring the teacher's
/// `EventBusConfig::DEFAULT_BUFFER_CAPACITY`.
pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 1024;

/// Environment variable names consulted by [`ExecutorDefaults::from_env`].
pub mod env_keys {
    pub const MAX_CONCURRENCY: &str = "GRAPHFLOW_MAX_CONCURRENCY";
    pub const NODE_TIMEOUT_MS: &str = "GRAPHFLOW_NODE_TIMEOUT_MS";
    pub const LLM_NODE_TIMEOUT_MS: &str = "GRAPHFLOW_LLM_NODE_TIMEOUT_MS";
    pub const CONTINUE_ON_ERROR: &str = "GRAPHFLOW_CONTINUE_ON_ERROR";
    pub const EVENT_BUFFER_CAPACITY: &str = "GRAPHFLOW_EVENT_BUFFER_CAPACITY";
}

/// Process-wide executor defaults, resolved from the environment once at
/// startup and then threaded explicitly through [`ExecutionRequest`]s —
/// never read from the environment again mid-run.
///
/// [`ExecutionRequest`]: crate::scheduler::ExecutionRequest
#[derive(Clone, Debug)]
pub struct ExecutorDefaults {
    pub max_concurrency: usize,
    pub node_timeout: Duration,
    pub llm_node_timeout: Duration,
    pub continue_on_error: bool,
    pub event_buffer_capacity: usize,
}

impl Default for ExecutorDefaults {
    fn default() -> Self {
        let options = ExecutorOptions::default();
        Self {
            max_concurrency: options.max_concurrency,
            node_timeout: options.node_timeout,
            llm_node_timeout: options.llm_node_timeout,
            continue_on_error: options.continue_on_error,
            event_buffer_capacity: DEFAULT_EVENT_BUFFER_CAPACITY,
        }
    }
}

impl ExecutorDefaults {
    /// Loads a `.env` file if present (no-op if absent) and reads each
    /// `GRAPHFLOW_*` variable, falling back to [`Self::default`] for any
    /// that are unset or fail to parse.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            max_concurrency: env_parsed(env_keys::MAX_CONCURRENCY).unwrap_or(defaults.max_concurrency),
            node_timeout: env_parsed::<u64>(env_keys::NODE_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.node_timeout),
            llm_node_timeout: env_parsed::<u64>(env_keys::LLM_NODE_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.llm_node_timeout),
            continue_on_error: env_parsed(env_keys::CONTINUE_ON_ERROR).unwrap_or(defaults.continue_on_error),
            event_buffer_capacity: env_parsed(env_keys::EVENT_BUFFER_CAPACITY).unwrap_or(defaults.event_buffer_capacity),
        }
    }

    /// Converts these defaults into an [`ExecutorOptions`], leaving
    /// `retry_policy`/`circuit_breakers` unset — those are per-execution
    /// policy objects, not plain environment-tunable scalars.
    #[must_use]
    pub fn into_executor_options(self) -> ExecutorOptions {
        ExecutorOptions::default()
            .with_max_concurrency(self.max_concurrency)
            .with_node_timeout(self.node_timeout)
            .with_llm_node_timeout(self.llm_node_timeout)
            .with_continue_on_error(self.continue_on_error)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_executor_options_default() {
        let defaults = ExecutorDefaults::default();
        let options = ExecutorOptions::default();
        assert_eq!(defaults.max_concurrency, options.max_concurrency);
        assert_eq!(defaults.node_timeout, options.node_timeout);
        assert_eq!(defaults.llm_node_timeout, options.llm_node_timeout);
        assert_eq!(defaults.continue_on_error, options.continue_on_error);
    }

    #[test]
    fn env_parsed_falls_back_on_missing_or_invalid_value() {
        std::env::remove_var("GRAPHFLOW_TEST_MISSING");
        assert_eq!(env_parsed::<usize>("GRAPHFLOW_TEST_MISSING"), None);

        std::env::set_var("GRAPHFLOW_TEST_INVALID", "not-a-number");
        assert_eq!(env_parsed::<usize>("GRAPHFLOW_TEST_INVALID"), None);
        std::env::remove_var("GRAPHFLOW_TEST_INVALID");
    }

    #[test]
    fn into_executor_options_carries_scalar_fields_through() {
        let defaults = ExecutorDefaults {
            max_concurrency: 8,
            node_timeout: Duration::from_secs(5),
            llm_node_timeout: Duration::from_secs(60),
            continue_on_error: true,
            event_buffer_capacity: 256,
        };
        let options = defaults.into_executor_options();
        assert_eq!(options.max_concurrency, 8);
        assert_eq!(options.node_timeout, Duration::from_secs(5));
        assert!(options.continue_on_error);
    }
}
