use std::net::SocketAddr;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatcastError, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 15; // SSE comment cadence, bounds dead-peer detection

/// Top-level config (chatcast.toml + CHATCAST_* env overrides).
///
/// Env keys nest on a double underscore: `CHATCAST_GATEWAY__PORT=9000`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatcastConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Resolve `bind:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let raw = format!("{}:{}", self.bind, self.port);
        raw.parse().map_err(|_| ChatcastError::InvalidAddress(raw))
    }
}

/// Settings for the `/chat/events` SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Interval between keep-alive comments on idle streams.
    /// A dead peer is noticed on the next write, so this is also the upper
    /// bound on how long a silently dropped client stays subscribed.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

impl StreamConfig {
    pub fn keep_alive(&self) -> Duration {
        // zero would make the keep-alive timer spin
        Duration::from_secs(self.keep_alive_secs.max(1))
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_keep_alive_secs() -> u64 {
    DEFAULT_KEEP_ALIVE_SECS
}

impl ChatcastConfig {
    /// Load config from a TOML file with CHATCAST_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.chatcast/chatcast.toml
    ///
    /// A missing file is not an error; defaults fill every field.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(path = %path, "loading config");

        Self::figment(&path)
            .extract()
            .map_err(|e| ChatcastError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(ChatcastConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CHATCAST_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chatcast/chatcast.toml", home)
}
