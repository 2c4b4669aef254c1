// src/exec/executor.rs

//! The per-vertex work abstraction.
//!
//! The runner talks to an [`Executor`] for every vertex it dispatches. The
//! trait returns a boxed future, in the same style as an object-safe async
//! trait, so executors can be stored as `Arc<dyn Executor>` and shared.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::livelog::LogSink;
use crate::types::VertexConfig;

/// Boxed, `Send` future returned by executors.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What an executor reports back for one invocation.
pub type ExecResult = anyhow::Result<()>;

/// Performs the actual work of a vertex.
///
/// Implementations may write any number of lines and errors to the
/// [`LogSink`]; only the returned result decides whether the vertex failed.
pub trait Executor: Send + Sync + 'static {
    fn execute<'a>(
        &'a self,
        name: &'a str,
        config: &'a VertexConfig,
        log: LogSink,
    ) -> BoxFuture<'a, ExecResult>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute<'a>(
        &'a self,
        name: &'a str,
        config: &'a VertexConfig,
        log: LogSink,
    ) -> BoxFuture<'a, ExecResult> {
        (**self).execute(name, config, log)
    }
}

/// Executor backed by a closure; see [`from_fn`].
pub struct FnExecutor<F> {
    f: F,
}

/// Turn an async closure into an [`Executor`].
///
/// The closure receives owned copies of the vertex name and config so the
/// returned future can be `'static`.
///
/// ```ignore
/// runner.add_vertex("hello", from_fn(|name, _cfg, _log| async move {
///     println!("{name}");
///     Ok(())
/// }), VertexConfig::default());
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(String, VertexConfig, LogSink) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecResult> + Send + 'static,
{
    FnExecutor { f }
}

impl<F, Fut> Executor for FnExecutor<F>
where
    F: Fn(String, VertexConfig, LogSink) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecResult> + Send + 'static,
{
    fn execute<'a>(
        &'a self,
        name: &'a str,
        config: &'a VertexConfig,
        log: LogSink,
    ) -> BoxFuture<'a, ExecResult> {
        Box::pin((self.f)(name.to_string(), config.clone(), log))
    }
}
