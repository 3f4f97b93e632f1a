//! Configuration management for the GitHub issues client

use std::time::Duration;

use compact_str::CompactString;

use super::error::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Main configuration for the GitHub issues client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitHub API base URL
    pub base_url: CompactString,
    /// Optional access token; unauthenticated calls get a lower upstream quota
    pub token: Option<CompactString>,
    /// Request configuration
    pub request: RequestConfig,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Outbound rate limit
    pub rate_limit: RateLimitConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of issues requested per poll
    pub per_page: u32,
    /// Request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: CompactString,
}

/// Fixed-delay retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
}

/// Token bucket configuration: `capacity` calls per `window`
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub window: Duration,
}

/// Polling interval configuration
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between polls, after the immediate first one
    pub interval: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            per_page: 10,
            timeout: Duration::from_secs(10),
            user_agent: "GitHub-Issue-Notifier".into(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, retry_delay: Duration::from_secs(5) }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { capacity: 30, window: Duration::from_secs(60) }
    }
}

impl PollingConfig {
    pub const MIN_INTERVAL: Duration = Duration::from_secs(60);
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval: Self::DEFAULT_INTERVAL }
    }
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<CompactString>, token: Option<CompactString>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            request: RequestConfig::default(),
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config_validation(
                "api_url",
                "Base URL cannot be empty",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config_validation(
                "api_url",
                "Base URL must start with http:// or https://",
            ));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ClientError::config_validation(
                "api_url",
                "Base URL is not a valid URL format",
            ));
        }

        if self.request.per_page == 0 || self.request.per_page > 100 {
            return Err(ClientError::config_validation(
                "per_page",
                "per_page must be between 1 and 100",
            ));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation(
                "request_timeout_secs",
                "Timeout must be greater than zero",
            ));
        }

        if self.rate_limit.capacity == 0 {
            return Err(ClientError::config_validation(
                "rate_limit_capacity",
                "Rate limit capacity must be greater than zero",
            ));
        }

        if self.rate_limit.window.is_zero() {
            return Err(ClientError::config_validation(
                "rate_limit_window_secs",
                "Rate limit window must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, None)
    }
}

impl ClientConfig {
    /// Set request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// Set retry configuration
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set rate limit configuration
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}
