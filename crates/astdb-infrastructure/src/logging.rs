//! Structured logging setup: stderr (human or JSON) plus optional rotating
//! file output, filtered by `RUST_LOG`/the configured log level.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output shape for stderr logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored when the terminal supports it.
    Pretty,
    /// One JSON object per line, for machine consumption (the query
    /// server's default when not attached to a tty).
    Json,
}

/// Logging setup options.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` if set.
    pub default_level: String,
    /// stderr output shape.
    pub format: LogFormat,
    /// If set, also write daily-rotated logs under this directory.
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber. Returns a [`WorkerGuard`] that
/// must be kept alive for the process lifetime so buffered file writes are
/// flushed on drop; the caller owns it (e.g. held in `main`'s local scope).
///
/// Safe to call once per process; a second call is a logic error but not
/// fatal (`set_global_default` failures are swallowed so tests using this
/// more than once don't panic).
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let stderr_layer = match config.format {
        LogFormat::Pretty => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_target(true).boxed(),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter(&config.default_level))
        .with(stderr_layer);

    let Some(log_dir) = &config.log_dir else {
        let _ = registry.try_init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(Path::new(log_dir), "astdb.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    let _ = registry.with(file_layer).try_init();
    Some(guard)
}
