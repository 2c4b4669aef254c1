// src/dag/cycle.rs

//! Directed cycle detection over a resolved [`DagGraph`].
//!
//! Three-colour depth-first search rooted at every unvisited vertex
//! (isolated ones included). Reaching a vertex that is still on the current
//! DFS path is a back edge, i.e. a cycle. The walk keeps an explicit stack so
//! deep chains cannot overflow the thread stack.

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::dag::vertex::VertexId;
use crate::errors::RunError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Return a vertex that lies on a cycle, if the graph has one.
pub fn find_cycle(graph: &DagGraph) -> Option<VertexId> {
    let mut marks = vec![Mark::Unvisited; graph.len()];

    for root in graph.ids() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }

        // Each frame is a vertex plus the dependents still to explore.
        let mut stack: Vec<(VertexId, Vec<VertexId>)> = Vec::new();
        marks[root.index()] = Mark::OnPath;
        stack.push((root, graph.dependents_of(root).collect()));

        while let Some((vertex, pending)) = stack.last_mut() {
            match pending.pop() {
                Some(next) => match marks[next.index()] {
                    Mark::Unvisited => {
                        marks[next.index()] = Mark::OnPath;
                        let children = graph.dependents_of(next).collect();
                        stack.push((next, children));
                    }
                    Mark::OnPath => {
                        debug!(
                            from = %graph.name(*vertex),
                            to = %graph.name(next),
                            "back edge found during cycle detection"
                        );
                        return Some(next);
                    }
                    Mark::Done => {}
                },
                None => {
                    marks[vertex.index()] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }

    None
}

/// Fail with [`RunError::CycleDetected`] if the graph is not acyclic.
pub fn ensure_acyclic(graph: &DagGraph) -> Result<(), RunError> {
    match find_cycle(graph) {
        Some(id) => Err(RunError::CycleDetected(graph.name(id).to_string())),
        None => Ok(()),
    }
}
