// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod livelog;
pub mod logging;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{GraphFile, default_config_path, load_and_validate};
use crate::engine::Runner;
use crate::errors::DagrunError;
use crate::exec::{Executor, ShellExecutor};
use crate::livelog::{LogReceiver, LogSink};

pub use crate::engine::RunnerOptions;
pub use crate::errors::RunError;
pub use crate::livelog::Line;
pub use crate::types::{Param, Payload, VertexConfig};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - graph file loading
/// - the runner, fed with a [`ShellExecutor`] for every vertex
/// - a printer task draining the live log to stdout / stderr
pub async fn run(args: CliArgs) -> Result<()> {
    let graph_path = args.graph.clone().unwrap_or_else(default_config_path);
    let mut graph = load_and_validate(&graph_path)
        .with_context(|| format!("loading graph file {}", graph_path.display()))?;

    if let Some(limit) = args.max_concurrency {
        graph.runner.max_concurrency = Some(limit);
    }

    let executor: Arc<dyn Executor> = Arc::new(ShellExecutor::new());
    let runner = graph.build_runner(executor);

    if args.dry_run {
        print_dry_run(&graph_path, &graph, &runner)?;
        return Ok(());
    }

    let (sink, receiver) = LogSink::channel(graph.runner.log_buffer);
    let printer = tokio::spawn(print_live_log(receiver));

    info!(
        graph = %graph_path.display(),
        vertices = runner.vertex_count(),
        edges = runner.edge_count(),
        "running graph"
    );
    let result = runner.run(&sink).await;

    // The runner has stopped every executor; dropping our sender closes the
    // channels and lets the printer finish.
    drop(sink);
    if let Err(e) = printer.await {
        warn!(error = %e, "live log printer task failed");
    }

    result.map_err(DagrunError::from)?;
    info!("all vertices succeeded");
    Ok(())
}

/// Print lines to stdout and executor errors to stderr until both channels close.
async fn print_live_log(mut receiver: LogReceiver) {
    let mut lines_open = true;
    let mut errors_open = true;

    while lines_open || errors_open {
        tokio::select! {
            line = receiver.lines.recv(), if lines_open => match line {
                Some(line) => println!("[{}:{}] {}", line.vertex, line.pos, line.message),
                None => lines_open = false,
            },
            err = receiver.errors.recv(), if errors_open => match err {
                Some(err) => eprintln!("[error] {err:#}"),
                None => errors_open = false,
            },
        }
    }

    debug!("live log closed");
}

/// Print the validated plan; fails the same way a real run would on
/// unknown dependencies or cycles.
fn print_dry_run(path: &Path, graph: &GraphFile, runner: &Runner) -> Result<()> {
    let order = runner.plan().map_err(DagrunError::from)?;

    println!("dagrun dry-run: {}", path.display());
    match graph.runner.max_concurrency {
        Some(n) => println!("  runner.max_concurrency = {n}"),
        None => println!("  runner.max_concurrency = unbounded"),
    }
    println!("  runner.log_buffer = {}", graph.runner.log_buffer);
    println!();

    println!("plan ({} vertices, {} edges):", order.len(), runner.edge_count());
    for (step, name) in order.iter().enumerate() {
        let Some(spec) = graph.vertex.get(name) else {
            continue;
        };
        println!("  {}. {name}", step + 1);
        if !spec.cmd.is_empty() {
            println!("      cmd: {:?}", spec.cmd);
        }
        if !spec.after.is_empty() {
            println!("      after: {:?}", spec.after);
        }
        if !spec.env.is_empty() {
            println!("      env: {:?}", spec.env.keys().collect::<Vec<_>>());
        }
        if let Some(ref payload) = spec.payload {
            println!(
                "      payload: {} bytes{}",
                payload.content.len(),
                if payload.compressed { " (compressed)" } else { "" }
            );
        }
        if let Some(ref language) = spec.language {
            println!("      language: {language}");
        }
        if let Some(secs) = spec.timeout_secs {
            println!("      timeout_secs: {secs}");
        }
        if let Some(width) = spec.width {
            println!("      width: {width}");
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
