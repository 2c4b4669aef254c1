// src/engine/mod.rs

//! Run orchestration.
//!
//! [`runner`] holds the public entry point: vertices and edges are collected
//! into a [`Runner`], validated, and executed. The pure scheduling state
//! machine lives in [`crate::dag::scheduler`]; the async/IO shell that spawns
//! executors and feeds completions back into it is [`dispatch`].

pub mod dispatch;
pub mod runner;

pub use runner::{Runner, RunnerOptions};
