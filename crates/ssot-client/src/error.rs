//! Client error types.

use thiserror::Error;

/// Errors returned by [`crate::NetboxClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response not covered by a more specific variant.
    #[error("inventory API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// 401 or 403.
    #[error("authentication failed (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("rate limited by inventory API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("{message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl ClientError {
    /// HTTP status carried by the error, when there was a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } | ClientError::Auth { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            ClientError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Transient failures worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::RateLimited { .. } | ClientError::Timeout(_) | ClientError::Transport(_)
        )
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidConfig(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_api_errors() {
        let err = ClientError::Api {
            status: 400,
            body: "{\"name\":[\"required\"]}".into(),
        };
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_server_error());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[test]
    fn test_server_error_classification() {
        let err = ClientError::Api {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_server_error());
        assert!(ClientError::Timeout("t".into()).is_retryable());
        assert!(!ClientError::NotFound("x".into()).is_retryable());
        assert_eq!(ClientError::NotFound("x".into()).status(), Some(404));
    }
}
