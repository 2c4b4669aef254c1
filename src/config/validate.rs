// src/config/validate.rs

use tracing::warn;

use crate::config::model::{GraphFile, RawGraphFile, VertexSpec};
use crate::errors::{DagrunError, Result};

impl TryFrom<RawGraphFile> for GraphFile {
    type Error = DagrunError;

    fn try_from(raw: RawGraphFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_graph(&raw)?;
        Ok(GraphFile::new_unchecked(raw.runner, raw.vertex))
    }
}

fn validate_raw_graph(raw: &RawGraphFile) -> Result<()> {
    validate_runner_section(raw)?;

    if raw.vertex.is_empty() {
        warn!("graph file has no [vertex.<name>] sections; nothing will run");
    }

    for (name, spec) in &raw.vertex {
        validate_vertex(name, spec)?;
    }
    Ok(())
}

fn validate_runner_section(raw: &RawGraphFile) -> Result<()> {
    if raw.runner.log_buffer == 0 {
        return Err(DagrunError::ConfigError(
            "[runner].log_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    if raw.runner.max_concurrency == Some(0) {
        return Err(DagrunError::ConfigError(
            "[runner].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_vertex(name: &str, spec: &VertexSpec) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DagrunError::ConfigError(
            "vertex names must not be empty".to_string(),
        ));
    }

    if spec.cmd.is_empty() && spec.payload.is_none() {
        return Err(DagrunError::ConfigError(format!(
            "vertex '{name}' needs a `cmd` or a `payload`"
        )));
    }

    if spec.cmd.first().is_some_and(|program| program.is_empty()) {
        return Err(DagrunError::ConfigError(format!(
            "vertex '{name}' has an empty program name in `cmd`"
        )));
    }

    if spec.timeout_secs == Some(0) {
        return Err(DagrunError::ConfigError(format!(
            "vertex '{name}': timeout_secs must be >= 1 (got 0)"
        )));
    }

    if spec.width == Some(0) {
        return Err(DagrunError::ConfigError(format!(
            "vertex '{name}': width must be >= 1 (got 0)"
        )));
    }

    Ok(())
}
