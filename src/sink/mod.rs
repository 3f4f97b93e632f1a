//! Notification sinks
//!
//! A sink displays one notification: a title, a message and a link. Which
//! sink is used is decided once at startup and injected into the dispatcher.

mod platform;

use std::sync::Arc;

use async_trait::async_trait;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub use platform::{LinuxSink, MacOsSink, WindowsSink};

use crate::result::{HeraldError, Result};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{command} not installed. Please install with: {hint}")]
    MissingCommand { command: CompactString, hint: CompactString },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed { command: CompactString, status: std::process::ExitStatus, stderr: String },

    #[error("Failed to run notification command: {0}")]
    Io(#[from] std::io::Error),
}

/// Displays a notification to the user.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn notify(&self, title: &str, message: &str, url: &str)
    -> std::result::Result<(), SinkError>;
}

/// Which sink to construct.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Pick by the operating system the binary runs on
    #[default]
    Auto,
    Macos,
    Linux,
    Windows,
    /// Write notifications to the log only
    Log,
}

/// Writes notifications through `tracing`, for headless hosts.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(
        &self,
        title: &str,
        message: &str,
        url: &str,
    ) -> std::result::Result<(), SinkError> {
        info!(title, message, url, "Notification");
        Ok(())
    }
}

impl SinkKind {
    /// Resolve `Auto` against an operating system name as found in
    /// [`std::env::consts::OS`].
    pub fn resolve(self, os: &str) -> Result<SinkKind> {
        match self {
            SinkKind::Auto => match os {
                "macos" => Ok(SinkKind::Macos),
                "linux" => Ok(SinkKind::Linux),
                "windows" => Ok(SinkKind::Windows),
                other => Err(HeraldError::UnsupportedPlatform(other.into())),
            },
            kind => Ok(kind),
        }
    }

    /// Build the sink for this kind on the current operating system.
    pub fn build(self) -> Result<Arc<dyn NotificationSink>> {
        let sink: Arc<dyn NotificationSink> = match self.resolve(std::env::consts::OS)? {
            SinkKind::Macos => Arc::new(MacOsSink),
            SinkKind::Linux => Arc::new(LinuxSink),
            SinkKind::Windows => Arc::new(WindowsSink),
            SinkKind::Log | SinkKind::Auto => Arc::new(LogSink),
        };
        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolves_per_platform() {
        assert_eq!(SinkKind::Auto.resolve("macos").unwrap(), SinkKind::Macos);
        assert_eq!(SinkKind::Auto.resolve("linux").unwrap(), SinkKind::Linux);
        assert_eq!(SinkKind::Auto.resolve("windows").unwrap(), SinkKind::Windows);
    }

    #[test]
    fn auto_rejects_unknown_platforms() {
        let err = SinkKind::Auto.resolve("freebsd").unwrap_err();
        assert!(matches!(err, HeraldError::UnsupportedPlatform(os) if os == "freebsd"));
    }

    #[test]
    fn explicit_kind_ignores_platform() {
        assert_eq!(SinkKind::Log.resolve("freebsd").unwrap(), SinkKind::Log);
        assert_eq!(SinkKind::Linux.resolve("macos").unwrap(), SinkKind::Linux);
    }

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let sink = SinkKind::Log.build().unwrap();
        assert_eq!(sink.name(), "log");
        sink.notify("New GitHub Issue", "#1: hello", "https://github.com/o/r/issues/1")
            .await
            .unwrap();
    }
}
