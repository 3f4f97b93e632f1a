//! Background polling for new issues

use tokio::{
    sync::broadcast,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use super::{
    config::PollingConfig,
    error::ClientError,
    service::{IssueService, PollPhase},
};
use crate::domain::PollState;

/// Periodic scheduler around [`IssueService`]
///
/// Runs one cycle as soon as it starts, then one per interval. Cycles never
/// overlap and missed ticks are skipped. Stops at the next wait point once the
/// cancellation token fires or a shutdown signal is sent.
#[derive(Debug)]
pub struct IssuePoller {
    service: IssueService,
    config: PollingConfig,
    state: PollState,
    cancel: CancellationToken,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

enum Wake {
    Tick,
    Stop(&'static str),
}

impl IssuePoller {
    pub fn new(service: IssueService, config: PollingConfig, cancel: CancellationToken) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            service,
            config,
            state: PollState::default(),
            cancel,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Resume from a previously returned state
    pub fn with_state(mut self, state: PollState) -> Self {
        self.state = state;
        self
    }

    /// Poll until stopped, returning the final state
    #[instrument(skip(self), fields(repository = %self.service.repository(), interval = ?self.config.interval))]
    pub async fn start(mut self) -> PollState {
        if self.cancel.is_cancelled() {
            debug!(phase = %PollPhase::Terminated, "Cancelled before start");
            return self.state;
        }

        info!("Starting issue poller");
        self.run_cycle().await;

        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            debug!(phase = %PollPhase::Idle);
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Stop("cancelled"),
                _ = self.shutdown_rx.recv() => Wake::Stop("shutdown requested"),
                _ = ticker.tick() => Wake::Tick,
            };

            match wake {
                Wake::Tick => self.run_cycle().await,
                Wake::Stop(reason) => {
                    info!(phase = %PollPhase::ShuttingDown, reason, "Stopping issue poller");
                    break;
                },
            }
        }

        debug!(phase = %PollPhase::Terminated, last_seen_id = %self.state.last_seen_id);
        self.state
    }

    /// Get a shutdown sender for external shutdown control
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    async fn run_cycle(&mut self) {
        match self.service.check_for_new_issues(&mut self.state, &self.cancel).await {
            Ok(report) => debug!(?report, "Poll cycle finished"),
            Err(ClientError::Cancelled | ClientError::RateLimitCancelled) => {
                debug!("Poll cycle interrupted by cancellation");
            },
            Err(e) => error!(error = %e, "Error checking for new issues"),
        }
    }
}
