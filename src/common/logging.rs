//! Logging and tracing configuration
//!
//! Logs always go to stderr. Stdout is reserved for the daemon pid and for
//! the lines mirrored in verbose mode.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("npipe=info,warn"))
}

/// Initialize tracing for a foreground run (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_foreground() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing for a detached run (stderr + optional log file)
///
/// Must be called after the fork, since the file writer runs on its own
/// thread. The returned guard flushes pending lines when dropped and has to
/// be kept alive for the lifetime of the process.
pub fn init_detached(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let Some(path) = log_file else {
        init_foreground();
        return None;
    };

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Could not open log file {}: {}", path.display(), e);
            init_foreground();
            return None;
        }
    };

    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    Some(guard)
}
