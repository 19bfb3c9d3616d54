use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset, blank or unparsable.
pub const DEFAULT_LOG_DIRECTIVES: &str = "warn,rps_backend=info,rps_algo=info,tower_http=info";

const LOG_FILE_PREFIX: &str = "rps-backend.log";

/// Keeps the non-blocking file writer alive; drop flushes it.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

pub fn build_env_filter(directives: &str) -> EnvFilter {
    let directives = directives.trim();
    if directives.is_empty() {
        return EnvFilter::new(DEFAULT_LOG_DIRECTIVES);
    }
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("invalid log directives {directives:?} ({e}), using {DEFAULT_LOG_DIRECTIVES}");
        EnvFilter::new(DEFAULT_LOG_DIRECTIVES)
    })
}

fn file_writer() -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !file_logging_enabled() {
        return None;
    }
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!("failed to create log directory {log_dir}: {err}");
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

/// Stdout always; a daily-rolling file under `LOG_DIR` when `ENABLE_FILE_LOGS` is set.
pub fn init_tracing(directives: &str) -> Option<FileLogGuard> {
    let registry = tracing_subscriber::registry()
        .with(build_env_filter(directives))
        .with(fmt::layer().with_target(true));

    match file_writer() {
        Some((writer, guard)) => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .init();
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            registry.init();
            None
        }
    }
}
