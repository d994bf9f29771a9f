//! Textual graph export (spec §6.4): two hand-rolled string builders, no
//! `petgraph` dependency required. Callers who want a `petgraph::DiGraph`
//! instead can use the optional `petgraph-compat` feature
//! ([`crate::graphs::petgraph_compat`]).

pub mod dot;
pub mod mermaid;

pub use dot::to_dot;
pub use mermaid::to_mermaid;
