// src/engine/runner.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::{DagGraph, Registry, ensure_acyclic};
use crate::engine::dispatch::Dispatcher;
use crate::errors::RunError;
use crate::exec::Executor;
use crate::livelog::LogSink;
use crate::types::VertexConfig;

/// Knobs that apply to a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Upper bound on vertices whose executor runs at the same time.
    ///
    /// `None` invokes every ready vertex's executor immediately. Vertices over
    /// the bound are still dispatched, and count as `Running` to the
    /// scheduler, but wait for a slot before their executor is invoked.
    /// Dependency order is unaffected.
    pub max_concurrency: Option<usize>,
}

/// Collects vertices and edges, then runs them in dependency order.
///
/// Every vertex runs exactly once, concurrently with any vertex it does not
/// (transitively) depend on. The first failure stops new dispatches, and
/// [`Runner::run`] only returns after all dispatched work has stopped.
///
/// A runner is consumed by `run`; build a new one for the next run.
#[derive(Debug, Default)]
pub struct Runner {
    registry: Registry,
    options: RunnerOptions,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RunnerOptions) -> Self {
        Self {
            registry: Registry::new(),
            options,
        }
    }

    pub fn options(&self) -> RunnerOptions {
        self.options
    }

    /// Register a vertex. Registering the same name again replaces the
    /// earlier executor and config.
    pub fn add_vertex<E: Executor>(
        &mut self,
        name: impl Into<String>,
        executor: E,
        config: VertexConfig,
    ) {
        self.add_shared_vertex(name, Arc::new(executor), config);
    }

    /// Like [`Runner::add_vertex`], for an executor shared between vertices.
    pub fn add_shared_vertex(
        &mut self,
        name: impl Into<String>,
        executor: Arc<dyn Executor>,
        config: VertexConfig,
    ) {
        self.registry.add_vertex(name.into(), executor, config);
    }

    /// Declare that `to` depends on `from`.
    ///
    /// Names are not checked here; an edge to an unregistered name makes
    /// [`Runner::run`] fail with [`RunError::MissingVertex`].
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.registry.add_edge(from.into(), to.into());
    }

    pub fn vertex_count(&self) -> usize {
        self.registry.len()
    }

    pub fn edge_count(&self) -> usize {
        self.registry.edges().len()
    }

    /// Validate the graph without running anything and return one order in
    /// which the vertices could run sequentially.
    pub fn plan(&self) -> Result<Vec<String>, RunError> {
        if self.registry.is_empty() {
            return Ok(Vec::new());
        }

        let graph = DagGraph::resolve(&self.registry)?;
        ensure_acyclic(&graph)?;

        Ok(graph
            .topological_order()?
            .into_iter()
            .map(|id| graph.name(id).to_string())
            .collect())
    }

    /// Validate the graph and execute every vertex.
    ///
    /// Returns `Ok(())`, [`RunError::MissingVertex`], [`RunError::CycleDetected`],
    /// or the first vertex failure observed. Structural errors are reported
    /// before any executor is invoked. `log` is only cloned into executors;
    /// the runner never reads from it.
    pub async fn run(self, log: &LogSink) -> Result<(), RunError> {
        if self.registry.is_empty() {
            debug!("no vertices registered; nothing to run");
            return Ok(());
        }

        let graph = DagGraph::resolve(&self.registry)?;
        ensure_acyclic(&graph)?;

        info!(
            vertices = graph.len(),
            edges = graph.edge_count(),
            max_concurrency = ?self.options.max_concurrency,
            "starting run"
        );

        let dispatcher = Dispatcher::new(
            &graph,
            self.registry.into_vertices(),
            log,
            self.options.max_concurrency,
        );
        dispatcher.run().await
    }
}
