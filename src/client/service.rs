//! One poll cycle: fetch, filter, dispatch

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::{api::IssueSource, error::Result};
use crate::{
    dedup,
    dispatcher::NotificationDispatcher,
    domain::PollState,
    id::RepositoryId,
};

/// Where the scheduler currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Fetching,
    Filtering,
    Dispatching,
    ShuttingDown,
    Terminated,
}

impl std::fmt::Display for PollPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PollPhase::Idle => "idle",
            PollPhase::Fetching => "fetching",
            PollPhase::Filtering => "filtering",
            PollPhase::Dispatching => "dispatching",
            PollPhase::ShuttingDown => "shutting_down",
            PollPhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Outcome of one successful fetch cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub new: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Checks one repository for new issues and notifies about them
#[derive(Debug, Clone)]
pub struct IssueService {
    source: Arc<dyn IssueSource>,
    dispatcher: NotificationDispatcher,
    repository: RepositoryId,
}

impl IssueService {
    pub fn new(
        source: Arc<dyn IssueSource>,
        dispatcher: NotificationDispatcher,
        repository: RepositoryId,
    ) -> Self {
        Self { source, dispatcher, repository }
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    /// Run one cycle against `state`.
    ///
    /// Each fetched issue is checked against `last_seen_id` as it stands at
    /// that point of the batch, so an id below one already notified in the
    /// same batch is skipped. A fetch failure aborts the cycle and leaves
    /// `state` untouched. A sink failure is logged and the remaining issues
    /// are still dispatched; `last_seen_id` only advances past issues whose
    /// notification succeeded.
    #[instrument(skip(self, state, cancel), fields(repository = %self.repository))]
    pub async fn check_for_new_issues(
        &self,
        state: &mut PollState,
        cancel: &CancellationToken,
    ) -> Result<CycleReport> {
        debug!(phase = %PollPhase::Fetching, "Checking for new issues");
        let issues = self.source.fetch_issues(&self.repository, cancel).await?;
        let fetched = issues.len();

        let mut report = CycleReport { fetched, ..CycleReport::default() };

        debug!(phase = %PollPhase::Filtering, fetched, last_seen_id = %state.last_seen_id);
        for issue in &issues {
            if !dedup::is_new(issue, state) {
                debug!(issue = %issue.number, id = %issue.id, "Already seen");
                continue;
            }
            report.new += 1;

            debug!(phase = %PollPhase::Dispatching, issue = %issue.number);
            match self.dispatcher.dispatch(issue, state).await {
                Ok(()) => {
                    dedup::advance(issue, state);
                    report.notified += 1;
                    info!(issue = %issue.number, title = %issue.title, "Notified about new issue");
                },
                Err(e) => {
                    report.failed += 1;
                    error!(issue = %issue.number, error = %e, "Failed to send notification");
                },
            }
        }

        if report.new == 0 {
            debug!("No new issues");
        }
        if report.failed > 0 {
            warn!(failed = report.failed, notified = report.notified, "Some notifications failed");
        }
        Ok(report)
    }
}
