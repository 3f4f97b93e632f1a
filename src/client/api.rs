//! Core HTTP client for the GitHub issues API

use async_trait::async_trait;
use compact_str::{CompactString, format_compact};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    rate_limit::RateLimiter,
    retry::RetryPolicy,
};
use crate::{domain::Issue, id::RepositoryId};

/// Anything that can list the latest open issues of a repository.
#[async_trait]
pub trait IssueSource: Send + Sync + std::fmt::Debug {
    async fn fetch_issues(
        &self,
        repository: &RepositoryId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>>;
}

/// HTTP client for the GitHub issues endpoint
///
/// Every fetch takes one rate limiter token, then runs the request under the
/// retry policy.
#[derive(Debug)]
pub struct GithubApi {
    client: Client,
    config: ClientConfig,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

/// GitHub API error response format
#[derive(Debug, Deserialize)]
struct GithubApiError {
    message: CompactString,
}

impl GithubApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .user_agent(config.request.user_agent.as_str())
            .build()
            .map_err(ClientError::Http)?;

        if !config.is_authenticated() {
            warn!("No GitHub token configured, requests are subject to the unauthenticated quota");
        }

        Ok(Self {
            limiter: RateLimiter::new(&config.rate_limit),
            retry: RetryPolicy::from(&config.retry),
            client,
            config,
        })
    }

    /// Fetch the newest open issues, pull requests excluded
    #[instrument(skip(self, repository, cancel), fields(repository = %repository))]
    pub async fn get_issues(
        &self,
        repository: &RepositoryId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>> {
        self.limiter.acquire(cancel).await?;

        let url = self.build_issues_url(repository);
        let url = url.as_str();
        let issues: Vec<Issue> = self
            .retry
            .run(cancel, |attempt| {
                debug!(attempt, "Requesting issues");
                self.get_json(url, cancel)
            })
            .await?;

        let total = issues.len();
        let issues: Vec<Issue> = issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .collect();

        debug!(
            issue_count = issues.len(),
            pull_requests = total - issues.len(),
            "Successfully fetched issues"
        );
        Ok(issues)
    }

    /// Perform one GET request and deserialize the JSON response
    async fn get_json<T>(&self, url: &str, cancel: &CancellationToken) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = self.request(url).send() => response?,
        };
        self.handle_response(response).await
    }

    /// Create the request builder, with credentials if configured
    fn request(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github.v3+json");

        match &self.config.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                debug!(endpoint = %url_path, body = %body, "Unparseable response body");
                ClientError::json_parse(url_path, "Failed to parse response", e)
            })
        } else {
            Err(Self::error_for_status(status, &body))
        }
    }

    /// Map a non-success response to a client error
    fn error_for_status(status: StatusCode, body: &str) -> ClientError {
        let message = serde_json::from_str::<GithubApiError>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .into()
            });

        match status {
            StatusCode::UNAUTHORIZED => ClientError::authentication(message),
            _ => ClientError::status(status.as_u16(), message),
        }
    }

    /// Build URL for the issues endpoint
    fn build_issues_url(&self, repository: &RepositoryId) -> CompactString {
        format_compact!(
            "{}/repos/{}/{}/issues?state=open&sort=created&direction=desc&per_page={}",
            self.config.base_url.trim_end_matches('/'),
            repository.owner(),
            repository.name(),
            self.config.request.per_page
        )
    }
}

#[async_trait]
impl IssueSource for GithubApi {
    async fn fetch_issues(
        &self,
        repository: &RepositoryId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>> {
        self.get_issues(repository, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_issues_url() {
        let api = GithubApi::new(ClientConfig::new("https://ghe.example.com/api/v3/", None)).unwrap();
        let url = api.build_issues_url(&RepositoryId::new("octo", "repo"));
        assert_eq!(
            url,
            "https://ghe.example.com/api/v3/repos/octo/repo/issues?state=open&sort=created&direction=desc&per_page=10"
        );
    }

    #[test]
    fn unauthorized_is_authentication_error() {
        let err = GithubApi::error_for_status(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com"}"#,
        );
        match err {
            ClientError::Authentication { message } => assert_eq!(message, "Bad credentials"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!GithubApi::error_for_status(StatusCode::UNAUTHORIZED, "").is_retryable());
    }

    #[test]
    fn other_statuses_are_retryable() {
        for status in [
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = GithubApi::error_for_status(status, "<html>oops</html>");
            assert!(
                matches!(&err, ClientError::Status { status: s, .. } if *s == status.as_u16()),
                "unexpected error: {err:?}"
            );
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let err = GithubApi::new(ClientConfig::new("not a url", None)).unwrap_err();
        assert!(matches!(err, ClientError::ConfigValidation { .. }));
    }
}
