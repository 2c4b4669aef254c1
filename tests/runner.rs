// tests/runner.rs

mod common;
use crate::common::{Recorder, init_tracing, live_log, with_timeout};

use std::error::Error;
use std::fmt;
use std::time::Duration;

use dagrun::engine::{Runner, RunnerOptions};
use dagrun::errors::RunError;
use dagrun::exec::from_fn;
use dagrun::types::VertexConfig;

type TestResult = Result<(), Box<dyn Error>>;

#[derive(Debug)]
struct Sentinel;

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sentinel")
    }
}

impl Error for Sentinel {}

fn add(runner: &mut Runner, name: &str, exec: impl dagrun::exec::Executor) {
    runner.add_vertex(name, exec, VertexConfig::default());
}

#[tokio::test]
async fn zero_vertices_succeed_without_log_traffic() -> TestResult {
    init_tracing();
    let (sink, mut rx) = live_log();

    let mut runner = Runner::new();
    // Edges alone do not make a graph.
    runner.add_edge("ghost", "other");

    runner.run(&sink).await?;

    let (lines, errors) = rx.drain_now();
    assert!(lines.is_empty());
    assert!(errors.is_empty());
    Ok(())
}

#[tokio::test]
async fn single_vertex_returns_the_executor_error() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();

    let mut runner = Runner::new();
    runner.add_vertex(
        "one",
        from_fn(|_, _, _| async { Err(anyhow::Error::new(Sentinel)) }),
        VertexConfig::default(),
    );

    let err = runner.run(&sink).await.unwrap_err();
    assert_eq!(err.vertex(), Some("one"));
    let source = err.executor_source().expect("executor error");
    assert!(source.downcast_ref::<Sentinel>().is_some());
    Ok(())
}

#[tokio::test]
async fn seven_vertices_run_in_dependency_order() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    for name in ["one", "two", "three", "four", "five", "six", "seven"] {
        add(&mut runner, name, rec.succeed());
    }
    for (from, to) in [
        ("one", "two"),
        ("one", "three"),
        ("two", "four"),
        ("two", "seven"),
        ("five", "six"),
    ] {
        runner.add_edge(from, to);
    }

    with_timeout(runner.run(&sink)).await?;

    let order = rec.finished();
    assert_eq!(order.len(), 7);
    let pos = |n: &str| {
        let hits: Vec<usize> = order
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_str() == n)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hits.len(), 1, "{n} should run exactly once");
        hits[0]
    };
    assert!(pos("one") < pos("two"));
    assert!(pos("one") < pos("three"));
    assert!(pos("two") < pos("four"));
    assert!(pos("two") < pos("seven"));
    assert!(pos("five") < pos("six"));
    Ok(())
}

#[tokio::test]
async fn completion_precedes_dependent_start_on_every_edge() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();
    let delay = Duration::from_millis(20);

    let edges = [
        ("fetch", "build"),
        ("fetch", "lint"),
        ("build", "test"),
        ("lint", "test"),
        ("test", "package"),
    ];

    let mut runner = Runner::new();
    for name in ["fetch", "build", "lint", "test", "package"] {
        add(&mut runner, name, rec.succeed().after(delay));
    }
    for (from, to) in edges {
        runner.add_edge(from, to);
    }

    with_timeout(runner.run(&sink)).await?;

    for (from, to) in edges {
        let before = rec.span(from).expect("from ran");
        let after = rec.span(to).expect("to ran");
        assert!(before.end <= after.start, "{from} must finish before {to} starts");
    }

    // Independent siblings overlap.
    let build = rec.span("build").expect("build ran");
    let lint = rec.span("lint").expect("lint ran");
    assert!(build.start < lint.end && lint.start < build.end);
    Ok(())
}

#[tokio::test]
async fn cycle_is_reported_before_any_dispatch() -> TestResult {
    init_tracing();
    let (sink, mut rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    for name in ["one", "two", "three", "four"] {
        add(&mut runner, name, rec.succeed());
    }
    runner.add_edge("one", "two");
    runner.add_edge("two", "three");
    runner.add_edge("three", "four");
    runner.add_edge("three", "one");

    let err = runner.run(&sink).await.unwrap_err();
    assert!(matches!(err, RunError::CycleDetected(_)));
    assert!(rec.started().is_empty());
    assert!(rx.drain_now().0.is_empty());
    Ok(())
}

#[tokio::test]
async fn edge_to_unregistered_vertex_is_rejected() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "one", rec.succeed());
    add(&mut runner, "two", rec.succeed());
    runner.add_edge("one", "two");
    runner.add_edge("two", "missing");

    match runner.run(&sink).await {
        Err(RunError::MissingVertex { from, to }) => {
            assert_eq!(from, "two");
            assert_eq!(to, "missing");
        }
        other => panic!("expected MissingVertex, got {other:?}"),
    }
    assert!(rec.started().is_empty());
    Ok(())
}

#[tokio::test]
async fn edge_from_unregistered_vertex_is_rejected() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "one", rec.succeed());
    runner.add_edge("missing", "one");

    let err = runner.run(&sink).await.unwrap_err();
    assert!(matches!(err, RunError::MissingVertex { .. }));
    assert!(rec.started().is_empty());
    Ok(())
}

#[tokio::test]
async fn many_independent_failures_report_one_error() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    for i in 0..10 {
        add(&mut runner, &format!("v{i}"), rec.fail(&format!("boom {i}")));
    }

    let err = with_timeout(runner.run(&sink)).await.unwrap_err();
    assert!(matches!(err, RunError::Executor { .. }));
    // All were roots, so all were dispatched and all stopped before `run` returned.
    assert_eq!(rec.finished().len(), 10);
    Ok(())
}

#[tokio::test]
async fn failing_sibling_lets_others_finish() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "bad", rec.fail("nope"));
    for name in ["slow_a", "slow_b", "slow_c"] {
        add(&mut runner, name, rec.succeed().after(Duration::from_millis(100)));
    }

    let err = with_timeout(runner.run(&sink)).await.unwrap_err();
    assert_eq!(err.vertex(), Some("bad"));
    assert!(err.to_string().contains("nope"));

    let finished = rec.finished();
    for name in ["slow_a", "slow_b", "slow_c"] {
        assert!(finished.iter().any(|v| v == name), "{name} should have completed");
    }
    Ok(())
}

#[tokio::test]
async fn failure_stops_all_further_dispatch() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "bad", rec.fail("nope"));
    add(&mut runner, "after_bad", rec.succeed());
    add(&mut runner, "slow", rec.succeed().after(Duration::from_millis(150)));
    add(&mut runner, "after_slow", rec.succeed());
    runner.add_edge("bad", "after_bad");
    runner.add_edge("slow", "after_slow");

    let err = with_timeout(runner.run(&sink)).await.unwrap_err();
    assert_eq!(err.vertex(), Some("bad"));

    assert_eq!(rec.runs_of("slow"), 1);
    assert_eq!(rec.runs_of("after_bad"), 0);
    // `slow` succeeded after the failure was seen; its dependent stays unrun.
    assert_eq!(rec.runs_of("after_slow"), 0);
    Ok(())
}

#[tokio::test]
async fn panicking_executor_fails_the_run_without_hanging() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "boom", rec.panic());
    add(&mut runner, "calm", rec.succeed().after(Duration::from_millis(50)));
    add(&mut runner, "after_boom", rec.succeed());
    runner.add_edge("boom", "after_boom");

    let err = with_timeout(runner.run(&sink)).await.unwrap_err();
    assert!(matches!(&err, RunError::Panicked(v) if v == "boom"));
    assert_eq!(rec.runs_of("calm"), 1);
    assert_eq!(rec.runs_of("after_boom"), 0);
    Ok(())
}

#[tokio::test]
async fn max_concurrency_bounds_running_executors() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::with_options(RunnerOptions {
        max_concurrency: Some(2),
    });
    for i in 0..8 {
        add(&mut runner, &format!("v{i}"), rec.succeed().after(Duration::from_millis(30)));
    }
    add(&mut runner, "last", rec.succeed());
    runner.add_edge("v0", "last");

    with_timeout(runner.run(&sink)).await?;

    assert_eq!(rec.finished().len(), 9);
    assert!(rec.peak_concurrency() <= 2, "peak was {}", rec.peak_concurrency());
    Ok(())
}

#[tokio::test]
async fn unbounded_run_starts_all_roots_together() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    for i in 0..6 {
        add(&mut runner, &format!("v{i}"), rec.succeed().after(Duration::from_millis(100)));
    }

    with_timeout(runner.run(&sink)).await?;
    assert_eq!(rec.peak_concurrency(), 6);
    Ok(())
}

#[tokio::test]
async fn re_registration_replaces_executor_and_keeps_edges() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "a", rec.fail("old registration"));
    add(&mut runner, "b", rec.succeed());
    runner.add_edge("a", "b");
    add(&mut runner, "a", rec.succeed());

    assert_eq!(runner.vertex_count(), 2);
    with_timeout(runner.run(&sink)).await?;
    assert_eq!(rec.finished(), vec!["a".to_string(), "b".to_string()]);
    Ok(())
}

#[tokio::test]
async fn executor_lines_reach_the_live_log() -> TestResult {
    init_tracing();
    let (sink, mut rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::new();
    add(&mut runner, "talker", rec.succeed().emitting(&["hello", "world"]));

    with_timeout(runner.run(&sink)).await?;

    let (lines, errors) = rx.drain_now();
    assert!(errors.is_empty());
    let got: Vec<(u64, &str)> = lines
        .iter()
        .map(|l| (l.pos, l.message.as_str()))
        .collect();
    assert_eq!(got, vec![(1, "hello"), (2, "world")]);
    assert!(lines.iter().all(|l| l.vertex == "talker"));
    Ok(())
}

#[test]
fn plan_lists_every_vertex_in_a_valid_order() -> TestResult {
    let rec = Recorder::new();
    let mut runner = Runner::new();
    for name in ["c", "b", "a"] {
        add(&mut runner, name, rec.succeed());
    }
    runner.add_edge("a", "b");
    runner.add_edge("b", "c");

    assert_eq!(runner.plan()?, vec!["a", "b", "c"]);
    assert!(rec.started().is_empty());
    Ok(())
}

#[tokio::test]
async fn bounded_vertices_wait_for_a_slot_before_invocation() -> TestResult {
    init_tracing();
    let (sink, _rx) = live_log();
    let rec = Recorder::new();

    let mut runner = Runner::with_options(RunnerOptions {
        max_concurrency: Some(1),
    });
    add(&mut runner, "first", rec.succeed().after(Duration::from_millis(50)));
    add(&mut runner, "second", rec.succeed().after(Duration::from_millis(50)));

    with_timeout(runner.run(&sink)).await?;

    // Both are roots and dispatched together; the bound serialises invocation.
    let a = rec.span("first").expect("first ran");
    let b = rec.span("second").expect("second ran");
    assert!(a.end <= b.start || b.end <= a.start);
    assert_eq!(rec.peak_concurrency(), 1);
    Ok(())
}
