use std::collections::BTreeMap;

use dagrun::config::{GraphFile, RawGraphFile, RunnerSection, VertexSpec};
use dagrun::types::Payload;

/// Builder for `GraphFile` to simplify test setup.
pub struct GraphFileBuilder {
    graph: RawGraphFile,
}

impl GraphFileBuilder {
    pub fn new() -> Self {
        Self {
            graph: RawGraphFile {
                runner: RunnerSection::default(),
                vertex: BTreeMap::new(),
            },
        }
    }

    pub fn with_vertex(mut self, name: &str, spec: VertexSpec) -> Self {
        self.graph.vertex.insert(name.to_string(), spec);
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.graph.runner.max_concurrency = Some(n);
        self
    }

    pub fn log_buffer(mut self, n: usize) -> Self {
        self.graph.runner.log_buffer = n;
        self
    }

    /// The unvalidated file, for exercising validation failures.
    pub fn build_raw(self) -> RawGraphFile {
        self.graph
    }

    pub fn build(self) -> GraphFile {
        GraphFile::try_from(self.graph).expect("Failed to build valid graph file from builder")
    }
}

impl Default for GraphFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `VertexSpec`.
pub struct VertexSpecBuilder {
    spec: VertexSpec,
}

impl VertexSpecBuilder {
    /// Vertex running `cmd`, split on whitespace.
    pub fn new(cmd: &str) -> Self {
        Self {
            spec: VertexSpec {
                cmd: cmd.split_whitespace().map(str::to_string).collect(),
                ..VertexSpec::default()
            },
        }
    }

    /// Vertex with no command that runs `script` through `language`.
    pub fn script(language: &str, script: &str) -> Self {
        Self {
            spec: VertexSpec {
                language: Some(language.to_string()),
                payload: Some(Payload::plain(script)),
                ..VertexSpec::default()
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.spec.after.push(dep.to_string());
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.spec.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.spec.timeout_secs = Some(secs);
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.spec.width = Some(width);
        self
    }

    pub fn build(self) -> VertexSpec {
        self.spec
    }
}
