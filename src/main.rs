// ParkinsonDetect - motion-pattern screening from the terminal
//
// Users record motion with a wearable sensor, submit the .zip archive to a
// remote prediction endpoint, and keep a local history of results.
//
// Architecture:
// - Store: JSON documents (users, analyses) in the platform data directory
// - Auth/Session: PBKDF2 password hashes, remembered or short-lived sessions
// - Predict: multipart upload to the endpoint, optional labelled demo fallback
// - App: single controller that owns the services and the current state
// - CLI (clap): one subcommand per task; TUI (ratatui): the history dashboard

mod analysis;
mod app;
mod auth;
mod charts;
mod cli;
mod config;
mod logging;
mod notify;
mod predict;
mod report;
mod session;
mod stats;
mod store;
mod tui;
mod util;

use anyhow::Result;
use app::App;
use clap::Parser;
use cli::{Cli, Commands};
use config::{Config, LogRotation};
use logging::{LogBuffer, TuiLogLayer};
use notify::Notification;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Set up tracing
///
/// The dashboard captures events into `dashboard_logs` so the alternate
/// screen is not garbled; every other command logs to stderr. File logging
/// (JSON lines) is added on top when enabled.
///
/// Precedence: RUST_LOG env var > config file > default "warn"
fn init_tracing(config: &Config, dashboard_logs: Option<LogBuffer>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directive().into());

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let (file_layer, guard) = if config.logging.file_enabled {
        match std::fs::create_dir_all(&config.logging.file_dir) {
            Ok(()) => {
                let dir = &config.logging.file_dir;
                let prefix = &config.logging.file_prefix;
                let file_appender = match config.logging.file_rotation {
                    LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
                    LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
                    LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
                };
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_ansi(false);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    config.logging.file_dir, e
                );
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    // Notifications are already printed; keep them out of the stderr stream
    let stderr_layer = dashboard_logs.is_none().then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter::filter_fn(|meta| {
                meta.target() != notify::LOG_TARGET
            }))
    });
    let tui_layer = dashboard_logs.map(TuiLogLayer::new);

    tracing_subscriber::registry()
        .with(filter)
        .with(tui_layer)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// Build the controller, resume the stored session and run one command
async fn run(command: Commands, config: Config, logs: LogBuffer) -> Result<()> {
    let mut app = App::new(config)?;
    if let Err(e) = app.restore() {
        tracing::warn!("Could not restore session: {}", e);
    }

    let result = cli::run(command, &mut app, logs).await;
    for notification in app.take_notifications() {
        notification.print();
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = Cli::parse().command.unwrap_or_default();

    // Config commands run before the file is parsed so a broken config can be reset
    if let Commands::Config(args) = &command {
        cli::handle_config(args);
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();
    let config = Config::from_env();

    let log_buffer = LogBuffer::new();
    let file_guard = init_tracing(&config, command.is_dashboard().then(|| log_buffer.clone()));

    tracing::debug!("pdetect {} starting", config::VERSION);
    if let Err(e) = run(command, config, log_buffer).await {
        Notification::error(e.to_string()).print();
        drop(file_guard);
        std::process::exit(1);
    }

    Ok(())
}
