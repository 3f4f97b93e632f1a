//! GitHub issues client modules
//!
//! The issue source, the outbound rate limiter and the retry policy it runs
//! under, and the poller that drives them on a schedule.

pub mod api;
pub mod config;
pub mod error;
pub mod poller;
pub mod rate_limit;
pub mod retry;
pub mod service;

// Re-export main types for convenience
pub use api::{GithubApi, IssueSource};
pub use config::{ClientConfig, PollingConfig, RateLimitConfig, RequestConfig, RetryConfig};
pub use error::ClientError;
pub use poller::IssuePoller;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use service::{CycleReport, IssueService, PollPhase};

pub type Result<T> = std::result::Result<T, ClientError>;
