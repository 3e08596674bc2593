//! Timeout and retry policy for downstream calls

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::{RetryConfig, ServiceEndpoint};
use crate::error::StageError;

/// How one pipeline stage calls its backend
#[derive(Debug, Clone)]
pub struct CallPolicy {
    /// Bound on each attempt
    pub timeout: Duration,
    /// Retries after the first attempt (transient failures only)
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub base_delay: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl CallPolicy {
    /// Policy for an endpoint under the configured retry settings
    pub fn for_endpoint(endpoint: &ServiceEndpoint, retry: &RetryConfig) -> Self {
        Self {
            timeout: endpoint.timeout(),
            max_retries: retry.max_retries,
            base_delay: Duration::from_millis(retry.base_delay_ms),
        }
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count and initial backoff
    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Backoff before retry number `attempt` (0-based)
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` under this policy
    ///
    /// An attempt that exceeds the timeout is dropped (cancelling its I/O) and
    /// reported as the stage's timeout error.
    pub async fn call<F, Fut, T, E>(&self, stage: &str, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StageError,
    {
        let mut attempt = 0;

        loop {
            let outcome = match timeout(self.timeout, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(E::timed_out(self.timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && e.is_transient() => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        stage,
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, RetrievalError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> CallPolicy {
        CallPolicy::default()
            .with_timeout(Duration::from_millis(50))
            .with_retries(max_retries, Duration::from_millis(1))
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = CallPolicy::default().with_retries(3, Duration::from_millis(100));
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_stage_error() {
        let result: Result<(), RetrievalError> = fast_policy(0)
            .call("retrieval", || async {
                sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(RetrievalError::Timeout(d)) if d == Duration::from_millis(50)
        ));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast_policy(2)
            .call("generation", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GenerationError::Unavailable("refused".into()))
                } else {
                    Ok("answer")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), GenerationError> = fast_policy(3)
            .call("generation", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::Status {
                    status: 400,
                    body: "bad request".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), RetrievalError> = fast_policy(1)
            .call("retrieval", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RetrievalError::Unavailable("refused".into()))
            })
            .await;

        assert!(matches!(result, Err(RetrievalError::Unavailable(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
