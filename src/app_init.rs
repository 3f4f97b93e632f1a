use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    client::{GithubApi, IssuePoller, IssueService},
    config::HeraldConfig,
    dispatcher::NotificationDispatcher,
    logging::{LoggingConfig, init_logging},
    result::Result,
};

pub struct AppComponents {
    pub poller: IssuePoller,
    pub cancel: CancellationToken,
}

/// Install the subscriber using the file's `log_level`.
///
/// The returned guard must be held until exit.
pub fn initialize_logging(config: &HeraldConfig, debug: bool) -> Result<Option<WorkerGuard>> {
    let logging_config = LoggingConfig::from_env()
        .with_console_level(config.log_level.as_deref())
        .with_debug(debug);

    let guard = init_logging(logging_config)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Issue herald starting up");
    Ok(guard)
}

/// Validate `config` and wire the poller together.
pub fn initialize_app(config: HeraldConfig) -> Result<AppComponents> {
    config.validate()?;
    let repository = config.repository()?;

    let api = Arc::new(GithubApi::new(config.to_client_config())?);
    let sink = config.sink.build()?;
    info!(repository = %repository, sink = sink.name(), "Watching for new issues");

    let dispatcher = NotificationDispatcher::new(sink, config.notify_config());
    let service = IssueService::new(api, dispatcher, repository);

    let cancel = CancellationToken::new();
    let poller = IssuePoller::new(service, config.polling_config(), cancel.clone());

    Ok(AppComponents { poller, cancel })
}
