use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Result, ServerError};

/// What happens when a username logs in from a second endpoint while still
/// active on the first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateLogin {
    /// The new login gets `ERR`.
    #[default]
    Reject,
    /// The old session is evicted.
    Replace,
}

/// What happens to a departed session's publications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeparturePolicy {
    /// Remove the session from every publisher set.
    ///
    /// A file whose only publisher departs leaves the catalog, so `get`
    /// answers `File not found` rather than `No active peer has this file`.
    #[default]
    Cascade,
    /// Keep the stale publishers; lookups skip them.
    ///
    /// Publishers are sessions, not usernames. A user who logs in again
    /// cannot `unp` entries from the old session, and those entries keep
    /// resolving to `No active peer has this file`.
    Retain,
}

/// Coordination server settings.
///
/// Every field has a default, so a TOML file only needs to mention what it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub credentials: PathBuf,
    pub heartbeat_interval_ms: u64,
    pub liveness_timeout_ms: u64,
    pub duplicate_login: DuplicateLogin,
    pub on_departure: DeparturePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            credentials: PathBuf::from("credentials.txt"),
            heartbeat_interval_ms: peersync_protocol::HEARTBEAT_INTERVAL
                .as_millis() as u64,
            liveness_timeout_ms: peersync_protocol::LIVENESS_TIMEOUT
                .as_millis() as u64,
            duplicate_login: DuplicateLogin::default(),
            on_departure: DeparturePolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Reads a TOML file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|source| ServerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The liveness timeout must leave room for at least one heartbeat.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval_ms == 0 {
            return Err(ServerError::Config(
                "heartbeat_interval_ms must be positive".into(),
            ));
        }
        if self.liveness_timeout_ms <= self.heartbeat_interval_ms {
            return Err(ServerError::Config(format!(
                "liveness_timeout_ms ({}) must be greater than \
                 heartbeat_interval_ms ({})",
                self.liveness_timeout_ms, self.heartbeat_interval_ms
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}
