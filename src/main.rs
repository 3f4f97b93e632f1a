use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use issue_herald::{
    app_init::{AppComponents, initialize_app, initialize_logging},
    config::{HeraldConfig, default_config_path, load_config, parse_interval, save_config},
    sink::SinkKind,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Desktop notifications for new GitHub issues
#[derive(Debug, Parser)]
#[command(name = "herald", version, about)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Repository to watch, `owner/repo` or a github.com URL
    #[arg(long, short)]
    repo: Option<String>,

    /// Poll interval: seconds, or a number with an s/m/h suffix
    #[arg(long, short, value_parser = interval_arg)]
    interval: Option<Duration>,

    /// Where notifications are shown
    #[arg(long, value_enum)]
    sink: Option<SinkKind>,

    /// Write debug logs to a file
    #[arg(long)]
    debug: bool,

    /// Write the default configuration file and exit
    #[arg(long)]
    init: bool,
}

fn interval_arg(value: &str) -> Result<Duration, String> {
    parse_interval(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    if args.init {
        return write_default_config(&config_path);
    }

    let dotenv = dotenvy::dotenv();

    let mut config = load_config(&config_path)?;
    let _log_guard = initialize_logging(&config, args.debug)?;

    config.apply_env(|key| std::env::var(key).ok());
    config.apply_overrides(args.repo.map(Into::into), args.interval, args.sink);

    let AppComponents { poller, cancel } = initialize_app(config)?;
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {},
        Err(e) => warn!(error = %e, "Failed to read .env"),
    }

    tokio::spawn(shutdown_signal(cancel));

    let state = poller.start().await;
    info!(last_seen_id = %state.last_seen_id, "Shutdown complete");
    Ok(())
}

fn write_default_config(path: &Path) -> color_eyre::Result<()> {
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    save_config(path, &HeraldConfig::default())?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }

    cancel.cancel();
}
