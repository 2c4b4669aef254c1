// src/dag/graph.rs

//! Resolved, index-keyed dependency graph for one run.
//!
//! Building a [`DagGraph`] is the validation step: every declared edge must
//! name two registered vertices. Node indices match [`VertexId`]s because
//! nodes are added in registration order.

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::dag::registry::Registry;
use crate::dag::vertex::VertexId;
use crate::errors::RunError;

#[derive(Debug, Clone)]
pub struct DagGraph {
    inner: DiGraph<String, ()>,
}

impl DagGraph {
    /// Resolve the registry's named edges into an indexed graph.
    ///
    /// Fails with [`RunError::MissingVertex`] on the first edge whose `from`
    /// or `to` was never registered.
    pub fn resolve(registry: &Registry) -> Result<Self, RunError> {
        let mut inner = DiGraph::with_capacity(registry.len(), registry.edges().len());

        for vertex in registry.vertices() {
            inner.add_node(vertex.name.clone());
        }

        for edge in registry.edges() {
            let (Some(from), Some(to)) = (registry.id_of(&edge.from), registry.id_of(&edge.to))
            else {
                return Err(RunError::MissingVertex {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            };
            inner.add_edge(node(from), node(to), ());
        }

        debug!(
            vertices = inner.node_count(),
            edges = inner.edge_count(),
            "dependency graph resolved"
        );

        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn name(&self, id: VertexId) -> &str {
        &self.inner[node(id)]
    }

    pub fn ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.inner.node_indices().map(|n| VertexId(n.index()))
    }

    /// Vertices that depend on `id`, one entry per declared edge.
    pub fn dependents_of(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.inner
            .neighbors_directed(node(id), Direction::Outgoing)
            .map(|n| VertexId(n.index()))
    }

    /// Vertices `id` depends on, one entry per declared edge.
    pub fn dependencies_of(&self, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.inner
            .neighbors_directed(node(id), Direction::Incoming)
            .map(|n| VertexId(n.index()))
    }

    /// In-degree of every vertex, indexed by id.
    ///
    /// Duplicate edges count once per declaration, matching how
    /// [`Self::dependents_of`] reports them on completion.
    pub fn dependency_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.len()];
        for edge in self.inner.edge_references() {
            counts[edge.target().index()] += 1;
        }
        counts
    }

    /// One valid execution order, or the vertex a cycle was found at.
    pub fn topological_order(&self) -> Result<Vec<VertexId>, RunError> {
        toposort(&self.inner, None)
            .map(|order| order.into_iter().map(|n| VertexId(n.index())).collect())
            .map_err(|cycle| RunError::CycleDetected(self.inner[cycle.node_id()].clone()))
    }
}

fn node(id: VertexId) -> NodeIndex {
    NodeIndex::new(id.0)
}
