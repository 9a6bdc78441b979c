use std::path::PathBuf;

use peersync_protocol::{Command, ProtocolError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PeerError>;

#[derive(Error, Debug)]
pub enum PeerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Server rejected {0}")]
    Rejected(Command),
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
