//! Graph definition, builder, and structural validation.
//!
//! The main entry point is [`GraphBuilder`], which accumulates nodes and
//! edges with a fluent API and compiles to a [`GraphDefinition`]. Call
//! [`GraphDefinition::validate`] before submitting a graph to the
//! scheduler — the executor validates internally, but a caller can check
//! earlier to fail fast.
//!
//! # Quick start
//!
//! ```
//! use graphflow::graphs::GraphBuilder;
//! use graphflow::node::{Node, NodeError};
//! use graphflow::scheduler::cancellation::CancellationSignal;
//! use graphflow::state::{NodeResult, WorkflowState};
//! use async_trait::async_trait;
//!
//! struct Passthrough;
//!
//! #[async_trait]
//! impl Node for Passthrough {
//!     fn id(&self) -> &str { "process" }
//!     fn name(&self) -> &str { "process" }
//!     async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
//!         NodeResult::success("process", "exec-1", state.clone())
//!     }
//!     fn input_keys(&self) -> &[String] { &[] }
//!     fn output_keys(&self) -> &[String] { &[] }
//! }
//!
//! let graph = GraphBuilder::new("g1", "demo")
//!     .add_node(Passthrough)
//!     .with_entry("process")
//!     .build();
//! assert!(graph.validate().is_empty());
//! ```

mod builder;
mod definition;
mod edges;

#[cfg(feature = "petgraph-compat")]
mod petgraph_compat;

pub use builder::GraphBuilder;
pub use definition::GraphDefinition;
pub use edges::{always_false, Edge, EdgePredicate};

#[cfg(feature = "petgraph-compat")]
pub use petgraph_compat::to_petgraph;
