use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Deserialize;
use tokio::time::Instant;

use crate::id::{IssueId, IssueNumber};

/// An entry of the repository issues endpoint.
///
/// The endpoint also lists pull requests; those carry a non-null
/// `pull_request` object and are dropped by the issue source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub number: IssueNumber,
    pub title: CompactString,
    pub created_at: DateTime<Utc>,
    pub html_url: CompactString,
    #[serde(default)]
    pub state: IssueState,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Mutable polling state, owned by the scheduler for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    /// Highest issue id already notified. Never decreases.
    pub last_seen_id: IssueId,
    /// When the sink was last handed a notification.
    pub last_notify_time: Option<Instant>,
}

impl Default for PollState {
    fn default() -> Self {
        Self { last_seen_id: IssueId::MIN, last_notify_time: None }
    }
}
