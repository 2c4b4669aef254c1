// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{GraphFile, RawGraphFile};
use crate::errors::Result;

/// Load a graph file from a given path and return the raw `RawGraphFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the sanity checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawGraphFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawGraphFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), vertices = raw.vertex.len(), "graph file parsed");

    Ok(raw)
}

/// Load a graph file from path and run config-level validation.
///
/// Graph structure (unknown `after` names, cycles) is checked later by the
/// runner itself, so `--dry-run` and a real run report it the same way.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<GraphFile> {
    let raw = load_from_path(&path)?;
    let graph = GraphFile::try_from(raw)?;
    Ok(graph)
}

/// `Dagrun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagrun.toml")
}
