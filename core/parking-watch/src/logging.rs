//! Tracing setup for the CLI.
//!
//! Two sinks:
//! - stderr, filtered by `RUST_LOG` (default `warn`, so cron mail stays quiet)
//! - `debug.log` under the storage root, `info` by default, `debug` when
//!   `PARKING_WATCH_DEBUG_LOG` is truthy
//!
//! The returned guard flushes the file writer on drop; hold it for the life of `main`.

use std::env;

use fs_err as fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use watch_core::StorageConfig;

const DEBUG_ENV: &str = "PARKING_WATCH_DEBUG_LOG";

pub fn init(storage: Option<&StorageConfig>) -> Option<WorkerGuard> {
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let (file_layer, guard) = match storage.and_then(file_writer) {
        Some((writer, guard)) => {
            let level = if debug_enabled() {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            };
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn file_writer(
    storage: &StorageConfig,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if fs::create_dir_all(storage.root()).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::never(storage.root(), storage.debug_log_name());
    Some(tracing_appender::non_blocking(appender))
}

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
