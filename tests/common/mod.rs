#![allow(dead_code)]

pub use dagrun_test_utils::builders;
pub use dagrun_test_utils::recorder::Recorder;
pub use dagrun_test_utils::{init_tracing, with_timeout};

use dagrun::livelog::{LogReceiver, LogSink};

/// Live log with enough buffer that no test executor ever waits on it.
pub fn live_log() -> (LogSink, LogReceiver) {
    LogSink::channel(1024)
}
