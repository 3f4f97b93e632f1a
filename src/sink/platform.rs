//! Desktop notification sinks backed by each platform's notification command

use std::{io::ErrorKind, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{NotificationSink, SinkError};

/// macOS, through `terminal-notifier`; clicking opens the issue.
#[derive(Debug, Default)]
pub struct MacOsSink;

/// Linux, through `notify-send`.
#[derive(Debug, Default)]
pub struct LinuxSink;

/// Windows, through a PowerShell tray balloon.
#[derive(Debug, Default)]
pub struct WindowsSink;

const TERMINAL_NOTIFIER: &str = "terminal-notifier";
const NOTIFY_SEND: &str = "notify-send";
const POWERSHELL: &str = "powershell";

fn terminal_notifier_args(title: &str, message: &str, url: &str) -> Vec<String> {
    vec![
        "-title".into(),
        title.into(),
        "-message".into(),
        message.into(),
        "-open".into(),
        url.into(),
        "-sound".into(),
        "default".into(),
    ]
}

fn notify_send_args(title: &str, message: &str, url: &str) -> Vec<String> {
    vec![title.into(), format!("{message}\n{url}")]
}

/// PowerShell single-quoted literal
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn balloon_script(title: &str, message: &str, url: &str) -> String {
    let text = format!("{message}\n\nClick to open: {url}");
    format!(
        "Add-Type -AssemblyName System.Windows.Forms; \
         $n = New-Object System.Windows.Forms.NotifyIcon; \
         $n.Icon = [System.Drawing.SystemIcons]::Information; \
         $n.BalloonTipTitle = {}; \
         $n.BalloonTipText = {}; \
         $n.Visible = $true; \
         $n.ShowBalloonTip(10000); \
         Start-Sleep -Seconds 10; \
         $n.Dispose()",
        ps_quote(title),
        ps_quote(&text)
    )
}

/// Run a notification command to completion.
async fn run(command: &str, args: &[String], hint: &str) -> Result<(), SinkError> {
    debug!(command, "Running notification command");
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => SinkError::MissingCommand {
                command: command.into(),
                hint: hint.into(),
            },
            _ => SinkError::Io(e),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(SinkError::CommandFailed {
            command: command.into(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[async_trait]
impl NotificationSink for MacOsSink {
    fn name(&self) -> &str {
        "macos"
    }

    async fn notify(&self, title: &str, message: &str, url: &str) -> Result<(), SinkError> {
        run(
            TERMINAL_NOTIFIER,
            &terminal_notifier_args(title, message, url),
            "brew install terminal-notifier",
        )
        .await
    }
}

#[async_trait]
impl NotificationSink for LinuxSink {
    fn name(&self) -> &str {
        "linux"
    }

    async fn notify(&self, title: &str, message: &str, url: &str) -> Result<(), SinkError> {
        run(
            NOTIFY_SEND,
            &notify_send_args(title, message, url),
            "your distribution's libnotify package (e.g. libnotify-bin)",
        )
        .await
    }
}

#[async_trait]
impl NotificationSink for WindowsSink {
    fn name(&self) -> &str {
        "windows"
    }

    /// The balloon stays up for ten seconds; the script is not awaited so the
    /// dispatcher is not held for that long.
    async fn notify(&self, title: &str, message: &str, url: &str) -> Result<(), SinkError> {
        let script = balloon_script(title, message, url);
        debug!(command = POWERSHELL, "Spawning notification command");
        Command::new(POWERSHELL)
            .args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SinkError::MissingCommand {
                    command: POWERSHELL.into(),
                    hint: "Windows PowerShell".into(),
                },
                _ => SinkError::Io(e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_notifier_opens_the_issue() {
        let args = terminal_notifier_args("New GitHub Issue", "#1: hi", "https://x/1");
        assert_eq!(
            args,
            ["-title", "New GitHub Issue", "-message", "#1: hi", "-open", "https://x/1", "-sound", "default"]
        );
    }

    #[test]
    fn notify_send_appends_link_to_body() {
        let args = notify_send_args("New GitHub Issue", "#1: hi", "https://x/1");
        assert_eq!(args, ["New GitHub Issue", "#1: hi\nhttps://x/1"]);
    }

    #[test]
    fn balloon_script_quotes_user_text() {
        let script = balloon_script("New GitHub Issue", "#3: don't '; rm", "https://x/3");
        assert!(script.contains("$n.BalloonTipTitle = 'New GitHub Issue';"));
        assert!(script.contains("'#3: don''t ''; rm\n\nClick to open: https://x/3'"));
    }

    #[tokio::test]
    async fn missing_command_is_reported_with_hint() {
        let err = run("herald-definitely-not-installed", &[], "cargo install it")
            .await
            .unwrap_err();
        match err {
            SinkError::MissingCommand { command, hint } => {
                assert_eq!(command, "herald-definitely-not-installed");
                assert_eq!(hint, "cargo install it");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
