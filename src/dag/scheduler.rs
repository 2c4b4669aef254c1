// src/dag/scheduler.rs

//! Dependency-counting dispatch state machine.
//!
//! The scheduler is synchronous and does no IO: it is told which vertices
//! completed and answers with the vertices that became ready. The async
//! shell in [`crate::engine::dispatch`] is its only caller during a run, so
//! none of this state is shared across tasks.

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::vertex::{VertexId, VertexOutcome, VertexState};

/// Result of feeding one completion into the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Vertices that must be dispatched now (already marked `Running`).
    pub newly_dispatched: Vec<VertexId>,
    /// Whether this completion was the one that halted the run.
    pub halted_now: bool,
}

#[derive(Debug)]
pub struct Scheduler<'g> {
    graph: &'g DagGraph,
    /// Unresolved dependency count per vertex.
    remaining: Vec<usize>,
    states: Vec<VertexState>,
    in_flight: usize,
    /// Set by the first failure; no further dispatches afterwards.
    halted: bool,
}

impl<'g> Scheduler<'g> {
    /// Build scheduler state for an already validated, acyclic graph.
    pub fn new(graph: &'g DagGraph) -> Self {
        let remaining = graph.dependency_counts();
        let states = remaining
            .iter()
            .map(|&count| {
                if count == 0 {
                    VertexState::Ready
                } else {
                    VertexState::Pending
                }
            })
            .collect();

        Self {
            graph,
            remaining,
            states,
            in_flight: 0,
            halted: false,
        }
    }

    /// Dispatch every vertex without dependencies.
    pub fn start(&mut self) -> Vec<VertexId> {
        let roots: Vec<VertexId> = self
            .graph
            .ids()
            .filter(|id| self.states[id.index()] == VertexState::Ready)
            .collect();

        for &id in &roots {
            self.mark_running(id);
        }

        info!(
            roots = roots.len(),
            vertices = self.graph.len(),
            "scheduler: dispatching initial vertices"
        );
        roots
    }

    /// Record the completion of a running vertex.
    ///
    /// On success (and only while the run is not halted) each dependent's
    /// count is decremented and those reaching zero are dispatched. The first
    /// failure halts the run: already running vertices still drain, but
    /// nothing new is dispatched.
    pub fn handle_completion(&mut self, id: VertexId, outcome: VertexOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        if self.states[id.index()] != VertexState::Running {
            warn!(
                vertex = %self.graph.name(id),
                state = ?self.states[id.index()],
                "completion for a vertex that is not running; ignoring"
            );
            return step;
        }

        self.in_flight -= 1;

        match outcome {
            VertexOutcome::Success => {
                self.states[id.index()] = VertexState::Succeeded;
                debug!(vertex = %self.graph.name(id), in_flight = self.in_flight, "vertex succeeded");
            }
            VertexOutcome::Failed => {
                self.states[id.index()] = VertexState::Failed;
                if !self.halted {
                    self.halted = true;
                    step.halted_now = true;
                    warn!(
                        vertex = %self.graph.name(id),
                        in_flight = self.in_flight,
                        "vertex failed; no further vertices will be dispatched"
                    );
                }
            }
        }

        if self.halted {
            return step;
        }

        let graph = self.graph;
        for dependent in graph.dependents_of(id) {
            let count = &mut self.remaining[dependent.index()];
            *count -= 1;
            if *count == 0 {
                self.states[dependent.index()] = VertexState::Ready;
                self.mark_running(dependent);
                step.newly_dispatched.push(dependent);
            }
        }

        if !step.newly_dispatched.is_empty() {
            debug!(
                vertex = %self.graph.name(id),
                dependents = step.newly_dispatched.len(),
                in_flight = self.in_flight,
                "dependencies resolved; dispatching dependents"
            );
        }

        step
    }

    /// Number of dispatched vertices that have not reported back yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// `true` once nothing is running; the run is over at that point.
    pub fn is_drained(&self) -> bool {
        self.in_flight == 0
    }

    pub fn state_of(&self, id: VertexId) -> VertexState {
        self.states[id.index()]
    }

    /// Count of vertices per terminal outcome, plus those never dispatched.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for state in &self.states {
            match state {
                VertexState::Succeeded => summary.succeeded += 1,
                VertexState::Failed => summary.failed += 1,
                VertexState::Pending | VertexState::Ready => summary.not_run += 1,
                VertexState::Running => summary.running += 1,
            }
        }
        summary
    }

    fn mark_running(&mut self, id: VertexId) {
        debug_assert_eq!(self.states[id.index()], VertexState::Ready);
        self.states[id.index()] = VertexState::Running;
        self.in_flight += 1;
    }
}

/// Per-state tally, logged at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
    pub not_run: usize,
}
