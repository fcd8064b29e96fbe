//! Entry point: config, logging, engine wiring, and the terminal UI.

use anyhow::Result;
use std::{path::PathBuf, sync::Arc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod credentials;
mod engine;
mod events;
mod input;
mod layout;
mod shortcuts;
mod tempo;
#[cfg(test)]
mod test_support;
mod ui;

use config::Config;
use credentials::{CredentialWatcher, FileCredentialStore};
use engine::{RefreshTimer, StateEngine};
use shortcuts::Shortcuts;
use tempo::HttpWorklogClient;

/// Initialize file logging and keep the non-blocking guard alive.
fn init_logging(cfg: &Config) -> Result<WorkerGuard> {
    // Write straight to a file so the TUI's stdout stays clean.
    let file_appender = tracing_appender::rolling::never(".", &cfg.logging.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {}", cfg.logging.file);
    Ok(guard)
}

#[tokio::main]
/// Entry point: config → logging → engine and triggers → UI → teardown.
async fn main() -> Result<()> {
    let cfg = Config::load_or_default(&PathBuf::from("config.toml"))?;
    let _log_guard = init_logging(&cfg)?;
    tracing::info!("app starting");

    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;
    let store = Arc::new(FileCredentialStore::new(cfg.credentials.path.clone()));
    let client = Arc::new(HttpWorklogClient::new(
        cfg.tempo.api_base_url.clone(),
        cfg.tempo.lookback_days,
        cfg.request_timeout(),
    )?);
    let engine = StateEngine::new(store.clone(), client);

    // Startup check, then the hourly timer and the credential file watcher.
    engine.check_credentials_and_refresh();
    let timer = RefreshTimer::spawn(engine.clone(), cfg.refresh_interval());
    let watcher =
        CredentialWatcher::spawn(store.clone(), engine.clone(), cfg.credentials_poll_interval());

    let mut terminal = ui::init_terminal()?;
    let res = app::run_app(&mut terminal, engine, store, shortcuts).await;
    // Always give the terminal back, even on error.
    ui::restore_terminal()?;

    drop(watcher);
    drop(timer);
    if let Err(ref e) = res {
        tracing::error!("app error: {e}");
    }
    tracing::info!("app exiting");
    res
}
