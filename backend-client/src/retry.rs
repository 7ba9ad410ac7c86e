use crate::error::ClientError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with linear backoff, applied only to failures that never
/// produced an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    pub async fn run<T, F, Fut>(&self, mut attempt_fn: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut retries = 0;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay_for(retries);
                    warn!(
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportKind;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    fn timeout() -> ClientError {
        ClientError::Transport {
            endpoint: "/analyze".to_string(),
            kind: TransportKind::Timeout,
            message: "timed out".to_string(),
        }
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transport_failures_then_succeeds() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = policy
            .run(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { if call < 3 { Err(timeout()) } else { Ok(call) } }
            })
            .await
            .expect("third attempt succeeds");

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let err = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(timeout()) }
            })
            .await
            .expect_err("exhausted");

        assert!(err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn http_errors_are_returned_immediately() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let err = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(ClientError::Http {
                        endpoint: "/analyze".to_string(),
                        status: StatusCode::SERVICE_UNAVAILABLE,
                        detail: None,
                        body: String::new(),
                    })
                }
            })
            .await
            .expect_err("not retried");

        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
