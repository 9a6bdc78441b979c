use std::{fs, path::Path, path::PathBuf, time::Duration};

use peersync_protocol::{CHUNK_SIZE, HEARTBEAT_INTERVAL, MIN_TRANSFER_BACKLOG};
use serde::{Deserialize, Serialize};

use crate::{PeerError, Result};

/// Settings of a peer process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Control endpoint of the coordination server, `host:port`.
    pub server: String,
    /// Address the transfer listener binds to and announces.
    pub transfer_host: String,
    /// 0 picks an ephemeral port.
    pub transfer_port: u16,
    pub backlog: u32,
    pub chunk_size: usize,
    pub heartbeat_interval_ms: u64,
    /// Files offered to other peers are read from here.
    pub shared_dir: PathBuf,
    /// Downloaded files are written here.
    pub download_dir: PathBuf,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:5000".to_string(),
            transfer_host: "127.0.0.1".to_string(),
            transfer_port: 0,
            backlog: MIN_TRANSFER_BACKLOG,
            chunk_size: CHUNK_SIZE,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL.as_millis() as u64,
            shared_dir: PathBuf::from("."),
            download_dir: PathBuf::from("."),
        }
    }
}

impl PeerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|source| PeerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config: PeerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backlog < MIN_TRANSFER_BACKLOG {
            return Err(PeerError::Config(format!(
                "backlog must be at least {MIN_TRANSFER_BACKLOG}"
            )));
        }
        if self.chunk_size == 0 || self.chunk_size > CHUNK_SIZE {
            return Err(PeerError::Config(format!(
                "chunk_size must be between 1 and {CHUNK_SIZE}"
            )));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(PeerError::Config(
                "heartbeat_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn transfer_addr(&self) -> String {
        format!("{}:{}", self.transfer_host, self.transfer_port)
    }
}
