//! Logging configuration using tracing
//!
//! The broker itself only emits `tracing` events; hosts that want them on
//! disk call [`init`] once at startup. Embedders with their own subscriber
//! can skip this entirely.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/devctx/logs/`.
/// Log level is controlled by the `DEVCTX_LOG` environment variable.
///
/// # Examples
/// ```bash
/// DEVCTX_LOG=debug my-host
/// DEVCTX_LOG=trace my-host
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "devctx.log");

    // Default to info, allow override via DEVCTX_LOG
    let env_filter =
        EnvFilter::try_from_env("DEVCTX_LOG").unwrap_or_else(|_| EnvFilter::new("devctx=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("devctx starting");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("devctx").join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_ends_with_crate_dirs() {
        let dir = get_log_directory();
        assert!(dir.ends_with("devctx/logs"));
    }
}
