//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::{LogConfig, LogFormat};

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` wins over the configured filter. Safe to call multiple times
/// (subsequent calls are no-ops).
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let _ = match config.format {
        // JSON logs + timestamps.
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };
}
