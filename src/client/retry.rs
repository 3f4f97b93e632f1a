//! Bounded fixed-delay retry around a single fallible attempt

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    config::RetryConfig,
    error::{ClientError, Result},
};

/// Retries retryable failures up to `max_retries` times, sleeping exactly
/// `retry_delay` between attempts. Terminal failures are returned as-is.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self { max_retries, retry_delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `attempt` until it succeeds, fails terminally, or attempts run out.
    ///
    /// The closure receives the 1-based attempt number. Cancellation during
    /// the inter-attempt sleep ends the loop with [`ClientError::Cancelled`].
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt_no = 0;

        loop {
            attempt_no += 1;

            let err = match attempt(attempt_no).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(attempt = attempt_no, error = %err, "Terminal failure, not retrying");
                return Err(err);
            }

            if attempt_no >= max_attempts {
                return Err(ClientError::FetchExhausted { attempts: attempt_no, last: Box::new(err) });
            }

            warn!(
                attempt = attempt_no,
                max_attempts,
                delay = ?self.retry_delay,
                error = %err,
                "Attempt failed, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(self.retry_delay) => {},
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay)
    }
}
