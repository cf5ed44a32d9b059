//! Application errors and exit codes
//!
//! - 0: Success
//! - 1: Configuration or initialisation failure
//! - 2: Run completed but at least one source failed

use ssot_engine::{ConfigError, EngineError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Run finished with failed sources: {}", .failed.join(", "))]
    PartialRun { failed: Vec<String> },
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Logging(_) | AppError::Engine(_) => 1,
            AppError::PartialRun { .. } => 2,
        }
    }

    /// Print the error to stderr.
    pub fn print(&self) {
        eprintln!("Error: {self}");
        if let Some(suggestion) = self.suggestion() {
            eprintln!("\nSuggestion: {suggestion}");
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::Invalid { field, .. }) if field == "netbox.apiToken" => {
                Some("Set netbox.apiToken in the config file or export NETBOX_API_TOKEN.")
            }
            AppError::Engine(EngineError::Inventory(_)) => {
                Some("Check netbox.hostname, netbox.port and that the API token is valid.")
            }
            AppError::PartialRun { .. } => {
                Some("Orphan removal was skipped for this run; see the log for source errors.")
            }
            _ => None,
        }
    }
}
