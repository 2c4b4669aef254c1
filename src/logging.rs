// src/logging.rs

//! Logging setup for `dagrun` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` CLI flag (if provided), applied to every target
//! 2. `DAGRUN_LOG`, parsed as `EnvFilter` directives
//!    (e.g. `"info"` or `"warn,dagrun::engine=debug"`)
//! 3. `info`
//!
//! Logs are sent to STDERR so that stdout carries only vertex output.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "DAGRUN_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(env_filter(cli_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Filter for the current process: CLI level, then `DAGRUN_LOG`, then `info`.
pub fn env_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref())
}

fn build_filter(cli_level: Option<LogLevel>, env_directives: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::new(level_directive(lvl));
    }

    match env_directives.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|err| {
            // No subscriber is installed yet, so this cannot go through tracing.
            eprintln!("dagrun: ignoring invalid {LOG_ENV}={directives:?}: {err}");
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}

fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Debug), Some("error"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn env_directives_allow_per_module_levels() {
        let filter = build_filter(None, Some("warn,dagrun::engine=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(filter.to_string().contains("dagrun::engine=trace"));
    }

    #[test]
    fn missing_or_invalid_env_falls_back_to_info() {
        assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(build_filter(None, Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            build_filter(None, Some("dagrun=loudest")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
