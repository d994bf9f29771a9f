#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use graphflow::scheduler::cancellation::CancellationSignal;
use graphflow::state::{NodeResult, WorkflowState};

/// Copies the incoming state through unchanged, optionally writing one
/// `data` key on the way out.
pub struct Passthrough {
    pub id: &'static str,
    write: Option<(&'static str, serde_json::Value)>,
}

impl Passthrough {
    pub fn new(id: &'static str) -> Self {
        Self { id, write: None }
    }

    pub fn writing(id: &'static str, key: &'static str, value: serde_json::Value) -> Self {
        Self { id, write: Some((key, value)) }
    }
}

#[async_trait]
impl graphflow::node::Node for Passthrough {
    fn id(&self) -> &str {
        self.id
    }
    fn name(&self) -> &str {
        self.id
    }
    async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
        let next = match &self.write {
            Some((k, v)) => state.with_data(*k, v.clone()),
            None => state.clone(),
        };
        NodeResult::success(self.id, "exec", next)
    }
    fn input_keys(&self) -> &[String] {
        &[]
    }
    fn output_keys(&self) -> &[String] {
        &[]
    }
}

/// Sleeps for `delay` before completing, for exercising concurrency and
/// timeout behaviour.
pub struct Delay {
    pub id: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl graphflow::node::Node for Delay {
    fn id(&self) -> &str {
        self.id
    }
    fn name(&self) -> &str {
        self.id
    }
    async fn execute(&self, state: &WorkflowState, cancel: &CancellationSignal) -> NodeResult {
        tokio::select! {
            () = tokio::time::sleep(self.delay) => NodeResult::success(self.id, "exec", state.clone()),
            () = cancel.cancelled() => NodeResult::failure(self.id, "exec", "cancelled", None),
        }
    }
    fn input_keys(&self) -> &[String] {
        &[]
    }
    fn output_keys(&self) -> &[String] {
        &[]
    }
}

/// Always fails with a fixed reason.
pub struct AlwaysFail {
    pub id: &'static str,
    pub reason: &'static str,
}

impl AlwaysFail {
    pub fn new(id: &'static str, reason: &'static str) -> Self {
        Self { id, reason }
    }
}

#[async_trait]
impl graphflow::node::Node for AlwaysFail {
    fn id(&self) -> &str {
        self.id
    }
    fn name(&self) -> &str {
        self.id
    }
    async fn execute(&self, _state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
        NodeResult::failure(self.id, "exec", self.reason, None)
    }
    fn input_keys(&self) -> &[String] {
        &[]
    }
    fn output_keys(&self) -> &[String] {
        &[]
    }
}

/// Records how many times it has concurrently been in flight, tracking
/// the observed peak, then sleeps briefly before completing.
pub struct ConcurrencyProbe {
    pub id: &'static str,
    pub current: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
    pub hold: Duration,
}

impl ConcurrencyProbe {
    pub fn new(id: &'static str, current: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Self {
        Self { id, current, peak, hold: Duration::from_millis(15) }
    }
}

#[async_trait]
impl graphflow::node::Node for ConcurrencyProbe {
    fn id(&self) -> &str {
        self.id
    }
    fn name(&self) -> &str {
        self.id
    }
    async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        NodeResult::success(self.id, "exec", state.clone())
    }
    fn input_keys(&self) -> &[String] {
        &[]
    }
    fn output_keys(&self) -> &[String] {
        &[]
    }
}

/// An LLM-tagged node, for exercising the `llm_node_timeout` split.
pub struct TaggedDelay {
    pub id: &'static str,
    pub delay: Duration,
    pub tag: &'static str,
}

#[async_trait]
impl graphflow::node::Node for TaggedDelay {
    fn id(&self) -> &str {
        self.id
    }
    fn name(&self) -> &str {
        self.id
    }
    async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
        tokio::time::sleep(self.delay).await;
        NodeResult::success(self.id, "exec", state.clone())
    }
    fn input_keys(&self) -> &[String] {
        &[]
    }
    fn output_keys(&self) -> &[String] {
        &[]
    }
    fn tag(&self) -> Option<&str> {
        Some(self.tag)
    }
}
