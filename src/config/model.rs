// src/config/model.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{Runner, RunnerOptions};
use crate::exec::Executor;
use crate::types::{Param, Payload, VertexConfig};

/// Graph file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [runner]
/// max_concurrency = 4
///
/// [vertex.fetch]
/// cmd = ["git", "fetch"]
///
/// [vertex.build]
/// cmd = ["cargo", "build"]
/// after = ["fetch"]
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGraphFile {
    #[serde(default)]
    pub runner: RunnerSection,

    /// All vertices from `[vertex.<name>]`, keyed by vertex name.
    #[serde(default)]
    pub vertex: BTreeMap<String, VertexSpec>,
}

/// Validated graph file. Only constructed through `TryFrom<RawGraphFile>`.
#[derive(Debug, Clone)]
pub struct GraphFile {
    pub runner: RunnerSection,
    pub vertex: BTreeMap<String, VertexSpec>,
}

impl GraphFile {
    pub(crate) fn new_unchecked(
        runner: RunnerSection,
        vertex: BTreeMap<String, VertexSpec>,
    ) -> Self {
        Self { runner, vertex }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            max_concurrency: self.runner.max_concurrency,
        }
    }

    /// Register every vertex with `executor` and turn `after` lists into edges.
    ///
    /// `after` names are not checked here; unknown ones make the returned
    /// runner fail with `MissingVertex`.
    pub fn build_runner(&self, executor: Arc<dyn Executor>) -> Runner {
        let mut runner = Runner::with_options(self.runner_options());

        for (name, spec) in &self.vertex {
            runner.add_shared_vertex(name.clone(), executor.clone(), spec.to_vertex_config());
        }

        // Edge direction: dep -> vertex. `after = ["A"]` on B adds A -> B.
        for (name, spec) in &self.vertex {
            for dep in &spec.after {
                runner.add_edge(dep.clone(), name.clone());
            }
        }

        runner
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Upper bound on concurrently executing vertices; unbounded if absent.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Capacity of the line and error channels printed by the CLI.
    #[serde(default = "default_log_buffer")]
    pub log_buffer: usize,
}

fn default_log_buffer() -> usize {
    5000
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            log_buffer: default_log_buffer(),
        }
    }
}

/// `[vertex.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VertexSpec {
    /// Program and arguments, e.g. `["cargo", "build", "--release"]`.
    #[serde(default)]
    pub cmd: Vec<String>,

    /// Vertices that must succeed before this one is dispatched.
    #[serde(default)]
    pub after: Vec<String>,

    /// Extra environment for the command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Inline script; piped to stdin, or run by `language` when `cmd` is empty.
    #[serde(default)]
    pub payload: Option<Payload>,

    #[serde(default)]
    pub width: Option<usize>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub language: Option<String>,
}

impl VertexSpec {
    pub fn to_vertex_config(&self) -> VertexConfig {
        VertexConfig {
            command: self.cmd.clone(),
            params: self
                .env
                .iter()
                .map(|(name, value)| Param::new(name.clone(), value.clone()))
                .collect(),
            payload: self.payload.clone(),
            width: self.width,
            timeout: self.timeout_secs.map(Duration::from_secs),
            language: self.language.clone(),
        }
    }
}
