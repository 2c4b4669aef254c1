// src/dag/vertex.rs

//! Vertex identity, registration data and per-run state.

use std::fmt;
use std::sync::Arc;

use crate::exec::Executor;
use crate::types::VertexConfig;

/// Stable index assigned to a vertex when it is first registered.
///
/// Ids are dense (`0..vertex_count`) and survive re-registration under the
/// same name, so every per-run table can be a plain `Vec` indexed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) usize);

impl VertexId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered unit of work.
#[derive(Clone)]
pub struct Vertex {
    pub name: String,
    pub config: Arc<VertexConfig>,
    pub executor: Arc<dyn Executor>,
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-run state of a vertex.
///
/// `Pending -> Ready -> Running -> Succeeded | Failed`. A vertex whose
/// prerequisites never resolve stays `Pending` for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexState {
    /// Waiting on at least one dependency.
    Pending,
    /// All dependencies done; about to be handed to the dispatcher.
    Ready,
    /// Dispatched. With a concurrency bound this includes waiting for a
    /// slot, so the executor may not have been invoked yet.
    Running,
    Succeeded,
    Failed,
}

/// Outcome of one vertex, as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexOutcome {
    Success,
    Failed,
}
