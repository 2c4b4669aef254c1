// src/engine/dispatch.rs

//! Async shell around the [`Scheduler`].
//!
//! Every dispatched vertex runs in its own Tokio task and reports exactly one
//! [`Completion`] on a channel sized to the vertex count, so reporting never
//! blocks. The drain loop in [`Dispatcher::run`] is the only code that touches
//! the scheduler, and it returns only once every dispatched vertex has
//! reported back.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info};

use crate::dag::{DagGraph, Scheduler, Vertex, VertexId, VertexOutcome};
use crate::errors::RunError;
use crate::livelog::LogSink;

/// Report sent by a vertex task when its executor has finished.
#[derive(Debug)]
struct Completion {
    id: VertexId,
    outcome: Result<(), RunError>,
}

pub struct Dispatcher<'g> {
    graph: &'g DagGraph,
    vertices: Vec<Vertex>,
    log: LogSink,
    limiter: Option<Arc<Semaphore>>,
    done_tx: mpsc::Sender<Completion>,
    done_rx: mpsc::Receiver<Completion>,
}

impl<'g> Dispatcher<'g> {
    /// `vertices` must be indexed by [`VertexId`], i.e. in registration order.
    pub fn new(
        graph: &'g DagGraph,
        vertices: Vec<Vertex>,
        log: &LogSink,
        max_concurrency: Option<usize>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel(vertices.len().max(1));
        let limiter = max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));

        Self {
            graph,
            vertices,
            log: log.clone(),
            limiter,
            done_tx,
            done_rx,
        }
    }

    /// Drive the run to completion and return the first recorded error.
    pub async fn run(mut self) -> Result<(), RunError> {
        let mut scheduler = Scheduler::new(self.graph);
        let mut first_error: Option<RunError> = None;

        for id in scheduler.start() {
            self.dispatch(id);
        }

        while !scheduler.is_drained() {
            // We hold a sender ourselves, so `None` cannot happen while
            // vertices are in flight.
            let Some(done) = self.done_rx.recv().await else {
                error!(
                    in_flight = scheduler.in_flight(),
                    "completion channel closed unexpectedly"
                );
                break;
            };

            let outcome = match done.outcome {
                Ok(()) => VertexOutcome::Success,
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    } else {
                        debug!(
                            vertex = %self.graph.name(done.id),
                            error = %err,
                            "dropping error; an earlier failure is already recorded"
                        );
                    }
                    VertexOutcome::Failed
                }
            };

            let step = scheduler.handle_completion(done.id, outcome);
            for id in step.newly_dispatched {
                self.dispatch(id);
            }
        }

        let summary = scheduler.summary();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            not_run = summary.not_run,
            "run finished; all dispatched vertices have stopped"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn dispatch(&self, id: VertexId) {
        let vertex = self.vertices[id.index()].clone();
        let log = self.log.clone();
        let limiter = self.limiter.clone();
        let done_tx = self.done_tx.clone();

        info!(vertex = %vertex.name, "dispatching vertex");

        tokio::spawn(async move {
            let outcome = run_vertex(vertex, log, limiter).await;
            if done_tx.send(Completion { id, outcome }).await.is_err() {
                debug!(%id, "completion receiver dropped before vertex reported");
            }
        });
    }
}

/// Invoke one vertex's executor, converting errors and panics into [`RunError`].
async fn run_vertex(
    vertex: Vertex,
    log: LogSink,
    limiter: Option<Arc<Semaphore>>,
) -> Result<(), RunError> {
    let name = vertex.name.clone();

    let _permit = match limiter {
        Some(sem) => Some(sem.acquire_owned().await.map_err(|e| RunError::Executor {
            vertex: name.clone(),
            source: anyhow::Error::from(e).context("acquiring concurrency permit"),
        })?),
        None => None,
    };

    debug!(vertex = %name, "invoking executor");

    // Run the executor in its own task so a panic surfaces as a JoinError
    // instead of silently losing this vertex's completion.
    let work = tokio::spawn(async move {
        vertex
            .executor
            .execute(&vertex.name, &vertex.config, log)
            .await
    });

    match work.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(RunError::Executor {
            vertex: name,
            source,
        }),
        Err(join_err) => {
            error!(vertex = %name, error = %join_err, "executor task panicked or was aborted");
            Err(RunError::Panicked(name))
        }
    }
}
