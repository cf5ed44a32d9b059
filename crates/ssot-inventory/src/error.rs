//! Inventory error types.

use ssot_client::ClientError;
use thiserror::Error;

/// Structural diff failures. These indicate a programming error in a
/// record's field view, never bad data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("cannot diff {new} against {existing}")]
    TypeMismatch {
        new: &'static str,
        existing: &'static str,
    },

    #[error("field {field}: {new} value cannot be compared with {existing} value")]
    KindMismatch {
        field: &'static str,
        new: &'static str,
        existing: &'static str,
    },
}

/// Errors returned by inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A REST call for a specific object failed.
    #[error("{kind} {key}: {source}")]
    Client {
        kind: &'static str,
        key: String,
        #[source]
        source: ClientError,
    },

    #[error("{kind} {key}: {source}")]
    Diff {
        kind: &'static str,
        key: String,
        #[source]
        source: DiffError,
    },

    /// Warm-load of a collection failed.
    #[error("failed to load {path}: {source}")]
    Load {
        path: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("inventory API unreachable: {0}")]
    Unreachable(#[source] ClientError),

    /// An observation was rejected before reaching the API.
    #[error("invalid {kind} {key}: {message}")]
    Invalid {
        kind: &'static str,
        key: String,
        message: String,
    },
}

impl InventoryError {
    /// HTTP status of the underlying API failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            InventoryError::Client { source, .. }
            | InventoryError::Load { source, .. }
            | InventoryError::Unreachable(source) => source.status(),
            _ => None,
        }
    }
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
