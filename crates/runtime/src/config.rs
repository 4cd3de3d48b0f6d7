//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Join requests beyond this many players are rejected.
    pub max_players: usize,
    /// Actions one player may buffer between two closed steps.
    pub max_actions_per_step: usize,
    /// Name reported in server-info replies.
    pub server_name: String,
    pub save_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            command_buffer_size: 32,
            max_players: 8,
            max_actions_per_step: 64,
            server_name: "stellar".to_string(),
            save_dir: default_save_dir(),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `STELLAR_EVENT_BUFFER` / `STELLAR_COMMAND_BUFFER`
    /// - `STELLAR_MAX_PLAYERS`
    /// - `STELLAR_MAX_ACTIONS` (per player per step)
    /// - `STELLAR_SERVER_NAME`
    /// - `STELLAR_SAVE_DIR` (default: platform data directory)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("STELLAR_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>("STELLAR_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        if let Some(max) = read_env::<usize>("STELLAR_MAX_PLAYERS") {
            config.max_players = max.max(1);
        }

        if let Some(max) = read_env::<usize>("STELLAR_MAX_ACTIONS") {
            config.max_actions_per_step = max.max(1);
        }

        if let Ok(name) = env::var("STELLAR_SERVER_NAME")
            && !name.trim().is_empty()
        {
            config.server_name = name;
        }

        if let Ok(dir) = env::var("STELLAR_SAVE_DIR") {
            config.save_dir = PathBuf::from(dir);
        }

        config
    }
}

/// Platform data directory for saved snapshots.
///
/// - Linux: `~/.local/share/stellar/saves`
/// - macOS: `~/Library/Application Support/stellar/saves`
/// - Fallback: `./save_data`
pub fn default_save_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "stellar")
        .map(|dirs| dirs.data_dir().join("saves"))
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

pub(crate) fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
