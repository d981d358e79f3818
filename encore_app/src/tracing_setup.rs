use std::io;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Initialise tracing with a non-blocking hourly-rolling file appender and,
/// optionally, a stdout layer
///
/// Respects `RUST_LOG`, falling back to `default_level`. The returned guard
/// must be held for the lifetime of the process or buffered log lines are
/// lost on exit.
pub fn init(app_name: &str, log_dir: &str, default_level: Level, stdout: bool) -> WorkerGuard {
    let _ = std::fs::create_dir_all(log_dir);

    // File I/O happens on a background thread
    let file_appender = tracing_appender::rolling::hourly(log_dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();

    let file_layer =
        fmt::layer().with_writer(non_blocking).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(false).compact();

    let stdout_layer = if stdout {
        Some(fmt::layer().with_writer(io::stdout).with_target(true).with_ansi(true).compact())
    } else {
        None
    };

    tracing_subscriber::registry().with(env_filter).with(file_layer).with(stdout_layer).init();

    guard
}
