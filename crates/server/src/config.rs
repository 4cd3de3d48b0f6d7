//! Server configuration structures and loaders.
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use stellar_protocol::{DEFAULT_FAST_PORT, DEFAULT_GAME_PORT};
use stellar_runtime::RuntimeConfig;

/// Configuration required to bootstrap the server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    /// Reliable ordered channel: handshake, turns, snapshots.
    pub game_port: u16,
    /// Status probes: answers server-info queries and closes.
    pub fast_port: u16,
    /// How long a step stays open for submissions.
    pub step_interval: Duration,
    /// Snapshot name restored at startup and rewritten after every step.
    pub autosave: Option<String>,
    /// Directory for the log file; stderr logging is always on.
    pub log_dir: Option<PathBuf>,
    pub runtime: RuntimeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            game_port: DEFAULT_GAME_PORT,
            fast_port: DEFAULT_FAST_PORT,
            step_interval: Duration::from_millis(1000),
            autosave: None,
            log_dir: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STELLAR_BIND_ADDR` - Listen address (default: 0.0.0.0)
    /// - `STELLAR_GAME_PORT` / `STELLAR_FAST_PORT` - Ports (default: 51255 / 51256)
    /// - `STELLAR_STEP_MS` - Step length in milliseconds (default: 1000)
    /// - `STELLAR_AUTOSAVE` - Snapshot name to restore and keep saving
    /// - `STELLAR_LOG_DIR` - Also write logs to `server.log` in this directory
    /// - plus everything [`RuntimeConfig::from_env`] reads
    pub fn from_env() -> Self {
        let mut config = Self {
            runtime: RuntimeConfig::from_env(),
            ..Self::default()
        };

        if let Some(addr) = read_env::<IpAddr>("STELLAR_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(port) = read_env::<u16>("STELLAR_GAME_PORT") {
            config.game_port = port;
        }

        if let Some(port) = read_env::<u16>("STELLAR_FAST_PORT") {
            config.fast_port = port;
        }

        if let Some(millis) = read_env::<u64>("STELLAR_STEP_MS") {
            config.step_interval = Duration::from_millis(millis.max(10));
        }

        config.autosave = env::var("STELLAR_AUTOSAVE")
            .ok()
            .filter(|name| !name.is_empty());

        config.log_dir = env::var("STELLAR_LOG_DIR").ok().map(PathBuf::from);

        config
    }

    pub fn game_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.game_port)
    }

    pub fn fast_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.fast_port)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
