// src/livelog.rs

//! Live output channel pair shared by every executor during a run.
//!
//! A [`LogSink`] is created and owned by the caller. The runner only clones it
//! into each dispatched vertex; it never reads from it and never closes it.
//! Channels close once the caller and every in-flight executor have dropped
//! their copies, which cannot happen before `Runner::run` returns.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

/// One line of output emitted by an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Vertex that produced the line.
    pub vertex: String,
    /// 1-based position, local to a single executor invocation.
    pub pos: u64,
    /// Capture time.
    pub time: DateTime<Utc>,
    pub message: String,
}

/// Sending half of the live log: one channel for lines, one for raw errors.
#[derive(Debug, Clone)]
pub struct LogSink {
    line_tx: mpsc::Sender<Line>,
    error_tx: mpsc::Sender<anyhow::Error>,
}

/// Receiving half returned by [`LogSink::channel`].
#[derive(Debug)]
pub struct LogReceiver {
    pub lines: mpsc::Receiver<Line>,
    pub errors: mpsc::Receiver<anyhow::Error>,
}

impl LogSink {
    /// Wrap caller-created channels.
    pub fn new(line_tx: mpsc::Sender<Line>, error_tx: mpsc::Sender<anyhow::Error>) -> Self {
        Self { line_tx, error_tx }
    }

    /// Create a sink with two buffered channels of the given capacity.
    ///
    /// A capacity of 0 is bumped to 1; tokio channels cannot be unbuffered.
    pub fn channel(capacity: usize) -> (Self, LogReceiver) {
        let capacity = capacity.max(1);
        let (line_tx, lines) = mpsc::channel(capacity);
        let (error_tx, errors) = mpsc::channel(capacity);
        (Self::new(line_tx, error_tx), LogReceiver { lines, errors })
    }

    /// Send a line, waiting for buffer space.
    ///
    /// Returns `false` if the caller already dropped the receiving side.
    pub async fn send_line(&self, line: Line) -> bool {
        match self.line_tx.send(line).await {
            Ok(()) => true,
            Err(err) => {
                debug!(vertex = %err.0.vertex, "live log line receiver dropped; discarding line");
                false
            }
        }
    }

    /// Report an out-of-band error. Purely informational for the caller.
    pub async fn send_error(&self, err: anyhow::Error) -> bool {
        match self.error_tx.send(err).await {
            Ok(()) => true,
            Err(_) => {
                debug!("live log error receiver dropped; discarding error");
                false
            }
        }
    }

    /// Start a fresh line sequence for one executor invocation.
    pub fn writer(&self, vertex: impl Into<String>) -> LineWriter {
        LineWriter {
            sink: self.clone(),
            vertex: vertex.into(),
            next_pos: 1,
        }
    }
}

/// Numbers lines for a single executor invocation, starting at 1.
#[derive(Debug)]
pub struct LineWriter {
    sink: LogSink,
    vertex: String,
    next_pos: u64,
}

impl LineWriter {
    /// Stamp and send one message. Returns the position it was given.
    pub async fn write(&mut self, message: impl Into<String>) -> u64 {
        let pos = self.next_pos;
        self.next_pos += 1;

        let line = Line {
            vertex: self.vertex.clone(),
            pos,
            time: Utc::now(),
            message: message.into(),
        };
        self.sink.send_line(line).await;
        pos
    }

    /// Number of lines written so far.
    pub fn written(&self) -> u64 {
        self.next_pos - 1
    }
}

impl LogReceiver {
    /// Collect whatever is currently buffered without waiting.
    pub fn drain_now(&mut self) -> (Vec<Line>, Vec<anyhow::Error>) {
        let mut lines = Vec::new();
        while let Ok(line) = self.lines.try_recv() {
            lines.push(line);
        }
        let mut errors = Vec::new();
        while let Ok(err) = self.errors.try_recv() {
            errors.push(err);
        }
        (lines, errors)
    }
}
