// src/errors.rs

//! Crate-wide error types.
//!
//! - [`RunError`] is what [`crate::engine::Runner::run`] returns: either a
//!   structural problem found before any dispatch, or the first failure
//!   reported by a vertex.
//! - [`DagrunError`] covers the config / CLI layer around the runner.

use thiserror::Error;

/// Error returned by a single `Runner::run` (or `Runner::plan`).
#[derive(Error, Debug)]
pub enum RunError {
    /// An edge references a name that was never registered with `add_vertex`.
    #[error("missing vertex: edge '{from}' -> '{to}' references an unregistered vertex")]
    MissingVertex { from: String, to: String },

    /// The registered edges contain a directed cycle.
    #[error("dependency cycle detected involving vertex '{0}'")]
    CycleDetected(String),

    /// The first failure reported by a vertex's executor.
    #[error("vertex '{vertex}' failed: {source:#}")]
    Executor {
        vertex: String,
        #[source]
        source: anyhow::Error,
    },

    /// A vertex's executor panicked instead of returning.
    #[error("vertex '{0}' panicked during execution")]
    Panicked(String),
}

impl RunError {
    /// The raw error returned by the executor, if this is an executor failure.
    ///
    /// Callers can downcast it to recover their own error types.
    pub fn executor_source(&self) -> Option<&anyhow::Error> {
        match self {
            RunError::Executor { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Name of the vertex that failed, for executor failures and panics.
    pub fn vertex(&self) -> Option<&str> {
        match self {
            RunError::Executor { vertex, .. } | RunError::Panicked(vertex) => Some(vertex),
            RunError::MissingVertex { .. } | RunError::CycleDetected(_) => None,
        }
    }
}

/// Error type for the config loading / CLI layer.
#[derive(Error, Debug)]
pub enum DagrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagrunError>;
