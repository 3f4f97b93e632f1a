//! Turns issues into notifications and hands them to the sink

use std::{sync::Arc, time::Duration};

use compact_str::{CompactString, format_compact};
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::{
    domain::{Issue, PollState},
    sink::{NotificationSink, SinkError},
};

pub const NOTIFICATION_TITLE: &str = "New GitHub Issue";

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Maximum message length in characters
    pub max_notification_length: usize,
    /// Minimum gap between two handoffs to the sink
    pub notify_delay: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { max_notification_length: 100, notify_delay: Duration::from_millis(500) }
    }
}

/// What the sink is asked to show for one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: CompactString,
    pub message: CompactString,
    pub url: CompactString,
}

impl NotificationPayload {
    pub fn from_issue(issue: &Issue, max_length: usize) -> Self {
        let message = format_compact!("#{}: {}", issue.number, issue.title);
        Self {
            title: NOTIFICATION_TITLE.into(),
            message: truncate_message(&message, max_length),
            url: issue.html_url.clone(),
        }
    }
}

/// Cut `message` to at most `max` characters, ending in `...` when cut.
///
/// A `max` of 3 or less leaves no room for the ellipsis; the message is then
/// simply cut.
pub fn truncate_message(message: &str, max: usize) -> CompactString {
    if message.chars().count() <= max {
        return message.into();
    }
    if max <= 3 {
        return message.chars().take(max).collect();
    }

    let mut truncated: CompactString = message.chars().take(max.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    config: NotifyConfig,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, config: NotifyConfig) -> Self {
        Self { sink, config }
    }

    /// Notify about one issue.
    ///
    /// Waits out whatever is left of `notify_delay` since the previous
    /// handoff, then calls the sink once. `last_notify_time` is updated
    /// whether or not the sink succeeded.
    #[instrument(skip(self, issue, state), fields(issue = %issue.number, sink = self.sink.name()))]
    pub async fn dispatch(&self, issue: &Issue, state: &mut PollState) -> Result<(), SinkError> {
        let payload = NotificationPayload::from_issue(issue, self.config.max_notification_length);

        if let Some(last) = state.last_notify_time {
            let elapsed = last.elapsed();
            if elapsed < self.config.notify_delay {
                let wait = self.config.notify_delay - elapsed;
                debug!(wait = ?wait, "Throttling notification");
                tokio::time::sleep(wait).await;
            }
        }

        let result = self
            .sink
            .notify(&payload.title, &payload.message, &payload.url)
            .await;
        state.last_notify_time = Some(Instant::now());

        if result.is_ok() {
            debug!("Notification delivered");
        }
        result
    }
}
