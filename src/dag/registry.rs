// src/dag/registry.rs

//! Graph registry: vertices by name, edges by name.
//!
//! Pure data. Edges may name vertices that are not registered yet; whether
//! they resolve is only checked when the graph is built for a run.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dag::vertex::{Vertex, VertexId};
use crate::exec::Executor;
use crate::types::VertexConfig;

/// Declared edge: `to` depends on `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDecl {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Default)]
pub struct Registry {
    vertices: Vec<Vertex>,
    by_name: HashMap<String, VertexId>,
    edges: Vec<EdgeDecl>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex, or replace the one already registered under `name`.
    ///
    /// A replaced vertex keeps its id; only its executor and config change.
    pub fn add_vertex(
        &mut self,
        name: String,
        executor: Arc<dyn Executor>,
        config: VertexConfig,
    ) -> VertexId {
        let vertex = Vertex {
            name: name.clone(),
            config: Arc::new(config),
            executor,
        };

        if let Some(&id) = self.by_name.get(&name) {
            warn!(vertex = %name, "vertex registered twice; replacing previous registration");
            self.vertices[id.0] = vertex;
            return id;
        }

        let id = VertexId(self.vertices.len());
        debug!(vertex = %name, %id, "vertex registered");
        self.vertices.push(vertex);
        self.by_name.insert(name, id);
        id
    }

    /// Record an edge. No existence checks.
    pub fn add_edge(&mut self, from: String, to: String) {
        self.edges.push(EdgeDecl { from, to });
    }

    pub fn id_of(&self, name: &str) -> Option<VertexId> {
        self.by_name.get(name).copied()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    /// Vertices in id order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeDecl] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Hand out the registered vertices, consuming the registry.
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}
