// src/config/mod.rs

//! Graph file loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and its conversion into a
//!   [`crate::engine::Runner`].
//! - `loader.rs`: reading a graph file from disk.
//! - `validate.rs`: config-level sanity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{GraphFile, RawGraphFile, RunnerSection, VertexSpec};
