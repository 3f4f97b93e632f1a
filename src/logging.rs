//! Tracing subscriber setup: a compact console layer and an optional JSON
//! file layer with daily rotation.

use std::path::PathBuf;

use directories::BaseDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::result::{HeraldError, Result};

pub const ENV_LOG_DIR: &str = "HERALD_LOG_DIR";
const LOG_FILE_PREFIX: &str = "herald.log";
const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `RUST_LOG` style directive, if one was given
    pub env_filter: Option<String>,
    /// Level from the config file, used when `RUST_LOG` is unset
    pub console_level: Option<String>,
    pub file_level: Level,
    /// Write JSON logs here when set
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            console_level: None,
            file_level: Level::INFO,
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            env_filter: non_empty(EnvFilter::DEFAULT_ENV),
            log_dir: non_empty(ENV_LOG_DIR).map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn with_console_level(mut self, level: Option<&str>) -> Self {
        self.console_level = level.map(str::to_string);
        self
    }

    /// File logging at debug level, in the default log directory unless one
    /// is already configured.
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.file_level = Level::DEBUG;
            if self.log_dir.is_none() {
                self.log_dir = Some(default_log_dir());
            }
        }
        self
    }

    fn console_directive(&self) -> &str {
        self.env_filter
            .as_deref()
            .or(self.console_level.as_deref())
            .unwrap_or(DEFAULT_DIRECTIVE)
    }
}

pub fn default_log_dir() -> PathBuf {
    match BaseDirs::new() {
        Some(dirs) => dirs.data_local_dir().join("issue-herald").join("logs"),
        None => PathBuf::from("logs"),
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_new(config.console_directive())
        .map_err(|e| HeraldError::Logging(format!("invalid log filter: {e}")))?;
    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_filter(console_filter);

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| HeraldError::Logging(format!("{}: {e}", dir.display())))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(LevelFilter::from_level(config.file_level));
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| HeraldError::Logging(e.to_string()))?;

    Ok(guard)
}
