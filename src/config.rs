//! Application configuration: the TOML file, `.env`/environment overrides
//! and conversion into the client, polling and notification settings.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use compact_str::CompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    client::{
        ClientConfig, PollingConfig, RateLimitConfig, RequestConfig, RetryConfig,
        config::DEFAULT_API_URL,
    },
    dispatcher::NotifyConfig,
    id::RepositoryId,
    result::{HeraldError, Result},
    sink::SinkKind,
};

pub const CONFIG_FILE_NAME: &str = "issue-herald.toml";

pub const ENV_REPO_URL: &str = "GITHUB_REPO_URL";
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// `owner/repo` or a github.com repository URL
    pub repository: Option<CompactString>,
    pub token: Option<CompactString>,
    pub poll_interval_secs: u64,
    pub sink: SinkKind,
    pub api_url: CompactString,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub rate_limit_capacity: u32,
    pub rate_limit_window_secs: u64,
    pub max_notification_length: usize,
    pub notify_delay_ms: u64,
    pub log_level: Option<CompactString>,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            repository: None,
            token: None,
            poll_interval_secs: PollingConfig::DEFAULT_INTERVAL.as_secs(),
            sink: SinkKind::Auto,
            api_url: DEFAULT_API_URL.into(),
            request_timeout_secs: 10,
            max_retries: 3,
            retry_delay_secs: 5,
            rate_limit_capacity: 30,
            rate_limit_window_secs: 60,
            max_notification_length: 100,
            notify_delay_ms: 500,
            log_level: None,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join(CONFIG_FILE_NAME)
    } else {
        PathBuf::from(CONFIG_FILE_NAME)
    }
}

/// Load the configuration file, or the defaults when it does not exist.
pub fn load_config(config_file: &Path) -> Result<HeraldConfig> {
    if !config_file.exists() {
        debug!(path = %config_file.display(), "No configuration file, using defaults");
        return Ok(HeraldConfig::default());
    }

    confy::load_path(config_file)
        .map_err(|e| HeraldError::config_load_error(config_file.to_path_buf(), e))
}

pub fn save_config(config_file: &Path, config: &HeraldConfig) -> Result<()> {
    confy::store_path(config_file, config)
        .map_err(|e| HeraldError::config_save_error(config_file.to_path_buf(), e))?;

    Ok(())
}

/// Parse a poll interval: plain seconds (`90`) or a number with an
/// `s`, `m` or `h` suffix.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let input = input.trim();
    let invalid = |reason: &str| {
        HeraldError::config_validation_error("poll_interval", format!("'{input}': {reason}"))
    };

    let (digits, unit) = match input.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&input[..i], Some(c.to_ascii_lowercase())),
        Some(_) => (input, None),
        None => return Err(invalid("empty interval")),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number"))?;

    let secs = match unit {
        None | Some('s') => Some(value),
        Some('m') => value.checked_mul(60),
        Some('h') => value.checked_mul(60 * 60),
        Some(_) => return Err(invalid("unit must be s, m or h")),
    };

    secs.map(Duration::from_secs)
        .ok_or_else(|| invalid("interval too large"))
}

impl HeraldConfig {
    /// Apply environment overrides, reading variables through `lookup`.
    ///
    /// An unparseable `POLL_INTERVAL` is logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(repo) = non_empty(ENV_REPO_URL) {
            self.repository = Some(repo.trim().into());
        }
        if let Some(token) = non_empty(ENV_TOKEN) {
            self.token = Some(token.trim().into());
        }
        if let Some(interval) = non_empty(ENV_POLL_INTERVAL) {
            match parse_interval(&interval) {
                Ok(interval) => self.poll_interval_secs = interval.as_secs(),
                Err(e) => warn!(
                    error = %e,
                    keeping = self.poll_interval_secs,
                    "Ignoring unparseable POLL_INTERVAL"
                ),
            }
        }
    }

    /// Apply command line overrides
    pub fn apply_overrides(
        &mut self,
        repository: Option<CompactString>,
        interval: Option<Duration>,
        sink: Option<SinkKind>,
    ) {
        if let Some(repository) = repository {
            self.repository = Some(repository);
        }
        if let Some(interval) = interval {
            self.poll_interval_secs = interval.as_secs();
        }
        if let Some(sink) = sink {
            self.sink = sink;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_notification_length <= 3 {
            return Err(HeraldError::config_validation_error(
                "max_notification_length",
                "must be greater than 3",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(HeraldError::config_validation_error(
                "request_timeout_secs",
                "must be greater than zero",
            ));
        }
        self.to_client_config().validate()?;
        self.repository().map(|_| ())
    }

    pub fn repository(&self) -> Result<RepositoryId> {
        match &self.repository {
            Some(repository) => RepositoryId::parse(repository),
            None => Err(HeraldError::config_validation_error(
                "repository",
                format!("set {ENV_REPO_URL}, pass --repo or add `repository` to the config file"),
            )),
        }
    }

    /// Poll interval with the 60 second floor applied.
    pub fn poll_interval(&self) -> Duration {
        let interval = Duration::from_secs(self.poll_interval_secs);
        if interval < PollingConfig::MIN_INTERVAL {
            warn!(
                requested = ?interval,
                minimum = ?PollingConfig::MIN_INTERVAL,
                "Poll interval below minimum, using minimum"
            );
            return PollingConfig::MIN_INTERVAL;
        }
        interval
    }

    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone(), self.token.clone())
            .with_request(RequestConfig {
                timeout: Duration::from_secs(self.request_timeout_secs),
                ..RequestConfig::default()
            })
            .with_retry(RetryConfig {
                max_retries: self.max_retries,
                retry_delay: Duration::from_secs(self.retry_delay_secs),
            })
            .with_rate_limit(RateLimitConfig {
                capacity: self.rate_limit_capacity,
                window: Duration::from_secs(self.rate_limit_window_secs),
            })
    }

    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig { interval: self.poll_interval() }
    }

    pub fn notify_config(&self) -> NotifyConfig {
        NotifyConfig {
            max_notification_length: self.max_notification_length,
            notify_delay: Duration::from_millis(self.notify_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parses_interval_forms() {
        assert_eq!(parse_interval("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_interval("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_interval(" 5m ").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("1H").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn rejects_malformed_intervals() {
        for input in ["", "m", "5x", "-5m", "1.5m", "five"] {
            let err = parse_interval(input).unwrap_err();
            assert!(
                matches!(&err, HeraldError::ConfigValidationError { field, .. } if field == "poll_interval"),
                "{input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = HeraldConfig {
            repository: Some("file/repo".into()),
            ..HeraldConfig::default()
        };
        config
            .apply_env(env(&[
                (ENV_REPO_URL, "https://github.com/env/repo"),
                (ENV_TOKEN, " ghp_abc "),
                (ENV_POLL_INTERVAL, "2m"),
            ]));

        assert_eq!(config.repository.as_deref(), Some("https://github.com/env/repo"));
        assert_eq!(config.token.as_deref(), Some("ghp_abc"));
        assert_eq!(config.poll_interval_secs, 120);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = HeraldConfig {
            token: Some("from-file".into()),
            ..HeraldConfig::default()
        };
        config.apply_env(env(&[(ENV_TOKEN, ""), (ENV_POLL_INTERVAL, "  ")]));
        assert_eq!(config.token.as_deref(), Some("from-file"));
        assert_eq!(config.poll_interval_secs, 300);
    }

    #[test]
    fn malformed_env_interval_keeps_current_value() {
        let mut config = HeraldConfig { poll_interval_secs: 600, ..HeraldConfig::default() };
        config.apply_env(env(&[(ENV_POLL_INTERVAL, "soon"), (ENV_REPO_URL, "octo/repo")]));
        assert_eq!(config.poll_interval_secs, 600);
        assert_eq!(config.repository.as_deref(), Some("octo/repo"));
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = HeraldConfig::default();
        config.apply_env(env(&[(ENV_REPO_URL, "env/repo")]));
        config.apply_overrides(Some("cli/repo".into()), Some(Duration::from_secs(600)), Some(SinkKind::Log));

        assert_eq!(config.repository().unwrap(), RepositoryId::new("cli", "repo"));
        assert_eq!(config.poll_interval(), Duration::from_secs(600));
        assert_eq!(config.sink, SinkKind::Log);
    }

    #[test]
    fn interval_is_clamped_to_floor() {
        let config = HeraldConfig { poll_interval_secs: 10, ..HeraldConfig::default() };
        assert_eq!(config.polling_config().interval, Duration::from_secs(60));
    }

    #[test]
    fn missing_repository_is_a_validation_error() {
        let err = HeraldConfig::default().validate().unwrap_err();
        assert!(matches!(err, HeraldError::ConfigValidationError { field, .. } if field == "repository"));
    }

    #[test]
    fn bad_api_url_fails_validation() {
        let config = HeraldConfig {
            repository: Some("o/r".into()),
            api_url: "api.github.com".into(),
            ..HeraldConfig::default()
        };
        assert!(matches!(config.validate(), Err(HeraldError::Client(_))));
    }

    #[test]
    fn tunables_flow_into_component_configs() {
        let config = HeraldConfig {
            token: Some("t".into()),
            max_retries: 1,
            retry_delay_secs: 2,
            rate_limit_capacity: 7,
            notify_delay_ms: 50,
            max_notification_length: 40,
            ..HeraldConfig::default()
        };

        let client = config.to_client_config();
        assert!(client.is_authenticated());
        assert_eq!(client.retry.max_retries, 1);
        assert_eq!(client.retry.retry_delay, Duration::from_secs(2));
        assert_eq!(client.rate_limit.capacity, 7);

        let notify = config.notify_config();
        assert_eq!(notify.notify_delay, Duration::from_millis(50));
        assert_eq!(notify.max_notification_length, 40);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(load_config(&path).unwrap(), HeraldConfig::default());
        assert!(!path.exists());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = HeraldConfig {
            repository: Some("octo/repo".into()),
            poll_interval_secs: 900,
            sink: SinkKind::Linux,
            ..HeraldConfig::default()
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "repository = \"octo/repo\"\nsink = \"log\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.repository.as_deref(), Some("octo/repo"));
        assert_eq!(config.sink, SinkKind::Log);
        assert_eq!(config.max_retries, 3);
    }
}
