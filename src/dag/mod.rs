// src/dag/mod.rs

//! Dependency graph representation and scheduling.
//!
//! - [`registry`] stores vertices and declared edges by name.
//! - [`graph`] resolves names into an indexed graph, rejecting edges that
//!   reference unregistered vertices, and computes dependency counts.
//! - [`cycle`] detects directed cycles before anything runs.
//! - [`scheduler`] is the synchronous dispatch state machine driven by the
//!   async shell in [`crate::engine`].
//! - [`vertex`] holds vertex ids, registration data and per-run states.

pub mod cycle;
pub mod graph;
pub mod registry;
pub mod scheduler;
pub mod vertex;

pub use cycle::{ensure_acyclic, find_cycle};
pub use graph::DagGraph;
pub use registry::{EdgeDecl, Registry};
pub use scheduler::{RunSummary, Scheduler, SchedulerStep};
pub use vertex::{Vertex, VertexId, VertexOutcome, VertexState};
