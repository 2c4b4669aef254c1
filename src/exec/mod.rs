// src/exec/mod.rs

//! Vertex execution layer.
//!
//! - [`executor`] defines the [`Executor`] trait the runner calls for every
//!   dispatched vertex, plus [`from_fn`] for closure-based executors.
//! - [`shell`] provides [`ShellExecutor`], which runs a vertex as an OS
//!   process and streams its stdout into the live log.

pub mod executor;
pub mod shell;

pub use executor::{BoxFuture, ExecResult, Executor, FnExecutor, from_fn};
pub use shell::ShellExecutor;
