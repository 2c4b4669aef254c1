pub mod builders;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// Upper bound for any single test run; a hung `Runner::run` fails the test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Uses the same filter rules as the binary, so `DAGRUN_LOG=dagrun::engine=debug
/// cargo test -- --nocapture` shows engine internals for a failing test.
pub fn init_tracing() {
    INIT.call_once(|| {
        fmt()
            .with_env_filter(dagrun::logging::env_filter(None))
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}
