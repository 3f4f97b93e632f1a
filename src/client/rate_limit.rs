//! Token bucket gate for outbound API calls

use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    config::RateLimitConfig,
    error::{ClientError, Result},
};

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter.
///
/// Starts full, refills continuously at `capacity / window` and never holds
/// more than `capacity` tokens.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_tokens", &self.max_tokens)
            .field("refill_rate", &self.refill_rate)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let max_tokens = f64::from(config.capacity);
        let window = config.window.as_secs_f64();
        let refill_rate = if window > 0.0 { max_tokens / window } else { 0.0 };

        Self {
            bucket: Mutex::new(TokenBucket { tokens: max_tokens, last_refill: Instant::now() }),
            max_tokens,
            refill_rate,
        }
    }

    /// Wait for a token.
    ///
    /// Fails with [`ClientError::RateLimitCancelled`] if `cancel` fires first;
    /// no token is consumed in that case.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::RateLimitCancelled);
            }

            let wait = match self.try_acquire().await {
                None => return Ok(()),
                Some(wait) => wait,
            };

            debug!(wait = ?wait, "Rate limit reached, waiting for a token");
            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::RateLimitCancelled),
                _ = tokio::time::sleep(wait) => {},
            }
        }
    }

    /// Take a token if one is available, otherwise report how long until one is.
    async fn try_acquire(&self) -> Option<Duration> {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();

        // Refill
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        bucket.last_refill = now;

        // Consume
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return None;
        }

        if self.refill_rate <= 0.0 {
            // Only cancellation ends the wait.
            return Some(Duration::from_secs(3600));
        }

        let missing = 1.0 - bucket.tokens;
        Some(Duration::from_secs_f64(missing / self.refill_rate).max(Duration::from_millis(1)))
    }

    #[cfg(test)]
    async fn available(&self) -> f64 {
        self.bucket.lock().await.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: u32, window: Duration) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig { capacity, window })
    }

    #[tokio::test(start_paused = true)]
    async fn allows_burst_up_to_capacity() {
        let limiter = limiter(3, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(&cancel).await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_refill_when_empty() {
        // 2 tokens per 10s: one token every 5s
        let limiter = limiter(2, Duration::from_secs(10));
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();
        limiter.acquire(&cancel).await.unwrap();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(5), "waited {waited:?}");
        assert!(waited < Duration::from_secs(6), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn never_banks_more_than_capacity() {
        let limiter = limiter(2, Duration::from_secs(2));
        let cancel = CancellationToken::new();
        tokio::time::sleep(Duration::from_secs(600)).await;
        limiter.acquire(&cancel).await.unwrap();
        assert!(limiter.available().await <= 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_wait_without_consuming() {
        let limiter = std::sync::Arc::new(limiter(1, Duration::from_secs(60)));
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();

        let handle = {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.acquire(&cancel).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ClientError::RateLimitCancelled)));
        assert!(limiter.available().await < 1.0);
    }

    #[tokio::test]
    async fn already_cancelled_fails_fast() {
        let limiter = limiter(5, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(limiter.acquire(&cancel).await, Err(ClientError::RateLimitCancelled)));
        assert_eq!(limiter.available().await, 5.0);
    }
}
