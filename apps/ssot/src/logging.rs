//! Logging setup using tracing.
//!
//! `RUST_LOG` takes precedence over `logger.level`. Output is human-readable
//! or JSON per `logger.format`, written to stderr or appended to
//! `logger.dest`.

use std::fs::OpenOptions;
use std::sync::Arc;

use ssot_engine::{LogFormat, LoggerConfig};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{AppError, AppResult};

/// Initialize the global tracing subscriber.
pub fn init_logging(config: &LoggerConfig) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.as_str()))
        .map_err(|e| AppError::Logging(format!("invalid log filter: {e}")))?;

    let (writer, ansi) = if config.dest.is_empty() {
        (BoxMakeWriter::new(std::io::stderr), true)
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.dest)
            .map_err(|e| AppError::Logging(format!("failed to open {}: {e}", config.dest)))?;
        (BoxMakeWriter::new(Arc::new(file)), false)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing::debug!(level = config.level.as_str(), "Logging initialized");
    Ok(())
}

/// Initialize logging for tests (with simpler output).
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_unwritable_dest_is_reported() {
        let config = LoggerConfig {
            dest: "/nonexistent/dir/ssot.log".to_string(),
            ..Default::default()
        };
        assert!(matches!(init_logging(&config), Err(AppError::Logging(_))));
    }
}
