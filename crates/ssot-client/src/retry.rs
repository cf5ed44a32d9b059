//! Exponential backoff for inventory API requests.

use crate::error::{ClientError, ClientResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy applied to every request.
///
/// The default performs no retries: a failed request is reported to the
/// caller straight away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: u64,
    /// Maximum delay cap in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_secs: 1,
            max_delay_secs: 30,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay_secs: u64) -> Self {
        Self {
            max_retries,
            base_delay_secs,
            ..Self::default()
        }
    }

    /// Whether the error should be retried at the given attempt number.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &ClientError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        error.is_retryable() || error.is_server_error()
    }

    /// Delay before the next attempt.
    ///
    /// A `Retry-After` hint from a 429 wins over the exponential schedule;
    /// both are capped at `max_delay_secs`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &ClientError) -> Duration {
        let secs = match error {
            ClientError::RateLimited {
                retry_after_secs: Some(retry_after),
            } => *retry_after,
            _ => self
                .base_delay_secs
                .saturating_mul(2u64.saturating_pow(attempt)),
        };
        Duration::from_secs(secs.min(self.max_delay_secs))
    }

    /// Run `f` until it succeeds, fails permanently, or the retry budget is
    /// spent.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut f: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt = attempt + 1, "Request succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        if attempt > 0 && attempt >= self.max_retries {
                            warn!(operation, attempts = attempt + 1, error = %error, "Max retries exceeded");
                            return Err(ClientError::MaxRetriesExceeded {
                                attempts: attempt + 1,
                                message: format!(
                                    "{operation} failed after {} attempt(s): {error}",
                                    attempt + 1
                                ),
                            });
                        }
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt, &error);
                    debug!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_policy_does_not_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 0);
        assert!(!policy.should_retry(0, &ClientError::Timeout("t".into())));
    }

    #[test]
    fn test_should_retry_server_error_only() {
        let policy = RetryPolicy::new(3, 1);
        let unavailable = ClientError::Api {
            status: 503,
            body: String::new(),
        };
        let bad_request = ClientError::Api {
            status: 400,
            body: String::new(),
        };
        assert!(policy.should_retry(0, &unavailable));
        assert!(!policy.should_retry(3, &unavailable));
        assert!(!policy.should_retry(0, &bad_request));
    }

    #[test]
    fn test_delay_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_secs: 1,
            max_delay_secs: 10,
        };
        let error = ClientError::Transport("reset".into());
        assert_eq!(policy.delay_for(0, &error), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2, &error), Duration::from_secs(4));
        assert_eq!(policy.delay_for(6, &error), Duration::from_secs(10));
    }

    #[test]
    fn test_delay_honours_retry_after() {
        let policy = RetryPolicy::new(5, 1);
        let error = ClientError::RateLimited {
            retry_after_secs: Some(7),
        };
        assert_eq!(policy.delay_for(3, &error), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_execute_without_retries_returns_original_error() {
        let policy = RetryPolicy::default();
        let result: ClientResult<()> = policy
            .execute("list", || async { Err(ClientError::Transport("reset".into())) })
            .await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }

    #[tokio::test]
    async fn test_execute_succeeds_after_retries() {
        let policy = RetryPolicy::new(3, 0);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute("create", move || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ClientError::Timeout("slow".into()))
                    } else {
                        Ok(5)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_max_retries_exceeded() {
        let policy = RetryPolicy::new(2, 0);
        let result: ClientResult<()> = policy
            .execute("patch", || async {
                Err(ClientError::Api {
                    status: 502,
                    body: String::new(),
                })
            })
            .await;
        match result {
            Err(ClientError::MaxRetriesExceeded { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected MaxRetriesExceeded, got {other:?}"),
        }
    }
}
