use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dagrun::exec::{BoxFuture, ExecResult, Executor};
use dagrun::livelog::LogSink;
use dagrun::types::VertexConfig;

/// Start and end of one executor invocation.
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start: Instant,
    pub end: Instant,
}

#[derive(Default)]
struct State {
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
    spans: Mutex<HashMap<String, Vec<Span>>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// Shared log of which vertices ran, in what order, and how many at once.
///
/// Hand out executors with [`Recorder::succeed`], [`Recorder::fail`] and
/// friends; they all report into the same recorder.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Arc<State>,
}

#[derive(Clone)]
enum Behaviour {
    Succeed,
    Fail(String),
    Panic,
}

/// Executor handed out by a [`Recorder`].
#[derive(Clone)]
pub struct RecordingExecutor {
    recorder: Recorder,
    behaviour: Behaviour,
    delay: Duration,
    lines: Vec<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(&self) -> RecordingExecutor {
        self.with(Behaviour::Succeed)
    }

    /// Fails with an `anyhow` error carrying `message`.
    pub fn fail(&self, message: &str) -> RecordingExecutor {
        self.with(Behaviour::Fail(message.to_string()))
    }

    pub fn panic(&self) -> RecordingExecutor {
        self.with(Behaviour::Panic)
    }

    fn with(&self, behaviour: Behaviour) -> RecordingExecutor {
        RecordingExecutor {
            recorder: self.clone(),
            behaviour,
            delay: Duration::ZERO,
            lines: Vec::new(),
        }
    }

    /// Vertex names in the order their executors were invoked.
    pub fn started(&self) -> Vec<String> {
        self.state.started.lock().unwrap().clone()
    }

    /// Vertex names in the order their executors returned.
    pub fn finished(&self) -> Vec<String> {
        self.state.finished.lock().unwrap().clone()
    }

    pub fn runs_of(&self, vertex: &str) -> usize {
        self.state
            .spans
            .lock()
            .unwrap()
            .get(vertex)
            .map_or(0, Vec::len)
    }

    /// First recorded span for `vertex`.
    pub fn span(&self, vertex: &str) -> Option<Span> {
        self.state
            .spans
            .lock()
            .unwrap()
            .get(vertex)
            .and_then(|spans| spans.first().copied())
    }

    /// Highest number of executors observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    fn enter(&self, vertex: &str) -> Instant {
        let now = Instant::now();
        self.state.started.lock().unwrap().push(vertex.to_string());
        let running = self.state.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(running, Ordering::SeqCst);
        now
    }

    fn leave(&self, vertex: &str, start: Instant) {
        self.state.running.fetch_sub(1, Ordering::SeqCst);
        self.state
            .spans
            .lock()
            .unwrap()
            .entry(vertex.to_string())
            .or_default()
            .push(Span {
                start,
                end: Instant::now(),
            });
        self.state.finished.lock().unwrap().push(vertex.to_string());
    }
}

impl RecordingExecutor {
    /// Sleep for `delay` before returning.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write these lines to the live log before returning.
    pub fn emitting(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }
}

impl Executor for RecordingExecutor {
    fn execute<'a>(
        &'a self,
        name: &'a str,
        _config: &'a VertexConfig,
        log: LogSink,
    ) -> BoxFuture<'a, ExecResult> {
        Box::pin(async move {
            let start = self.recorder.enter(name);

            let mut writer = log.writer(name);
            for line in &self.lines {
                writer.write(line.clone()).await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.recorder.leave(name, start);

            match &self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail(message) => Err(anyhow::anyhow!("{message}")),
                Behaviour::Panic => panic!("recording executor told to panic in '{name}'"),
            }
        })
    }
}
