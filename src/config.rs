//! overpass/src/config.rs
//! Process configuration, deserialized from an optional JSON file.

use crate::error::ProxyError;
use serde::Deserialize;
use std::{path::Path, time::Duration};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Address the proxy accepts game clients on.
    pub listen_addr: String,
    /// Address of the real game server.
    pub upstream_addr: String,
    /// Optional webhook notified on player join/leave.
    pub webhook_url: Option<String>,
    /// Seconds without traffic in either direction before a session is
    /// closed. Zero disables the timeout.
    pub idle_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:25565".to_string(),
            upstream_addr: "127.0.0.1:20000".to_string(),
            webhook_url: None,
            idle_timeout_secs: 300,
        }
    }
}

impl ProxyConfig {
    /// Loads configuration from a JSON file; without a path every field
    /// takes its default.
    pub fn load(path: Option<&Path>) -> Result<Self, ProxyError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ProxyError::Config(format!("reading {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    ProxyError::Config(format!("parsing {}: {}", path.display(), e))
                })
            }
            None => Ok(Self::default()),
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}
