//! Stellar authoritative game server.
//!
//! Composition root: loads configuration, installs logging, builds the
//! runtime, and accepts connections on the game and fast ports. Steps close
//! on a fixed interval; with `STELLAR_AUTOSAVE` set, the state is restored
//! from that snapshot at startup and saved after every step.
//!
//! ```bash
//! STELLAR_GAME_PORT=51255 STELLAR_AUTOSAVE=campaign cargo run -p stellar-server
//! ```

mod config;
mod connection;
mod logging;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use stellar_runtime::{FileSnapshotRepository, Runtime, SnapshotRepository};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();
    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    info!("Starting stellar server");

    let repository = FileSnapshotRepository::new(&config.runtime.save_dir).with_context(|| {
        format!(
            "failed to open save directory {}",
            config.runtime.save_dir.display()
        )
    })?;
    info!("Save directory: {}", repository.base_dir().display());
    let autosave_exists = config
        .autosave
        .as_deref()
        .is_some_and(|name| repository.exists(name));

    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .repository(repository)
        .build()
        .await?;

    if let Some(name) = config.autosave.as_deref()
        && autosave_exists
    {
        let snapshot = runtime.restore_snapshot(name).await?;
        info!(
            "Restored {} players from {} ({})",
            snapshot.registry.player_count(),
            name,
            snapshot.next_turn
        );
    }

    let game_listener = TcpListener::bind(config.game_addr())
        .await
        .with_context(|| format!("failed to bind game port {}", config.game_addr()))?;
    let fast_listener = TcpListener::bind(config.fast_addr())
        .await
        .with_context(|| format!("failed to bind fast port {}", config.fast_addr()))?;
    info!(
        "Listening on {} (game) and {} (fast)",
        config.game_addr(),
        config.fast_addr()
    );

    let mut steps = tokio::time::interval(config.step_interval);
    steps.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            accepted = game_listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "game connection");
                    let handle = runtime.handle();
                    tokio::spawn(async move {
                        if let Err(error) = connection::serve(stream, peer, handle).await {
                            warn!(%peer, "connection failed: {error:#}");
                        }
                    });
                }
                Err(error) => warn!(%error, "game accept failed"),
            },
            accepted = fast_listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let handle = runtime.handle();
                    tokio::spawn(async move {
                        if let Err(error) = connection::answer_probe(stream, peer, handle).await {
                            debug!(%peer, "probe failed: {error:#}");
                        }
                    });
                }
                Err(error) => warn!(%error, "fast accept failed"),
            },
            _ = steps.tick() => {
                let report = runtime.handle().close_step().await?;
                if !report.applied.is_empty() || !report.skipped.is_empty() {
                    debug!(turn = report.turn.0, "step closed");
                }
                if let Some(name) = config.autosave.as_deref()
                    && let Err(error) = runtime.save_snapshot(name).await
                {
                    error!(name, "autosave failed: {error}");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    if let Some(name) = config.autosave.as_deref() {
        runtime.save_snapshot(name).await?;
        info!("Saved {} before exit", name);
    }
    info!(
        "Saved games: {:?}",
        runtime.repository().list_names().unwrap_or_default()
    );

    // Connection tasks hold handle clones; the worker is detached with them.
    drop(runtime);

    Ok(())
}
