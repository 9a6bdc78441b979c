use thiserror::Error;

use crate::Command;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Datagram is not valid UTF-8")]
    NotUtf8,
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("Wrong arguments for {0}")]
    Arity(Command),
    #[error("Invalid transfer endpoint: {0:?}")]
    InvalidEndpoint(String),
    #[error("Invalid peer location: {0:?}")]
    InvalidLocation(String),
    #[error("Unexpected response to {command}: {text:?}")]
    UnexpectedResponse { command: Command, text: String },
}
