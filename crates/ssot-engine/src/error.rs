//! Engine error types.

use std::path::PathBuf;

use ssot_client::ClientError;
use ssot_inventory::InventoryError;
use thiserror::Error;

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field holds a value the engine cannot run with.
    #[error("invalid {field}: {message}")]
    Invalid { field: String, message: String },

    /// A relation line is not `<regex> = <value>` or its regex does not
    /// compile.
    #[error("invalid relation {line:?}: {message}")]
    Relation { line: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures reported by a source driver.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No factory is registered for the configured source type.
    #[error("unsupported source type: {0}")]
    UnsupportedType(String),

    #[error("invalid source configuration: {0}")]
    Config(String),

    /// The source could not reach or read its upstream.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Sync finished but some observations could not be written.
    #[error("{failed} of {total} objects failed to sync")]
    Partial { failed: usize, total: usize },
}

/// Failures that abort a run before any source is synced.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build inventory client: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}
