use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use crate::{
    Command, LIST_SEPARATOR, MSG_ERROR, MSG_OK, ProtocolError,
    RESP_FILE_NOT_FOUND, RESP_FILE_PUBLISHED, RESP_FILE_UNPUB_FAILED,
    RESP_FILE_UNPUBLISHED, RESP_NO_ACTIVE_PEER_HAS_FILE, RESP_NO_ACTIVE_PEERS,
    RESP_NO_FILES_FOUND, RESP_NO_PUBLISHED_FILES, Result,
};

/// Where a file can be fetched from: the publisher's username and the
/// transfer endpoint it announced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerLocation {
    pub username: String,
    pub endpoint: SocketAddr,
}

impl fmt::Display for PeerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.username,
            self.endpoint.ip(),
            self.endpoint.port()
        )
    }
}

impl FromStr for PeerLocation {
    type Err = ProtocolError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || ProtocolError::InvalidLocation(text.to_owned());
        let mut fields = text.split(' ');
        let (Some(username), Some(ip), Some(port), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };
        if username.is_empty() {
            return Err(invalid());
        }
        let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
        let port: u16 = port.parse().map_err(|_| invalid())?;
        Ok(PeerLocation {
            username: username.to_owned(),
            endpoint: SocketAddr::new(ip, port),
        })
    }
}

/// A control reply. Empty lists render as their "nothing" marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Ok,
    Err,
    ActivePeers(Vec<String>),
    PublishedFiles(Vec<String>),
    Published,
    Unpublished,
    UnpublishFailed,
    SearchResults(Vec<String>),
    Location(PeerLocation),
    FileNotFound,
    NoActivePeerHasFile,
}

impl Response {
    /// Interprets `text` as the reply to a request of kind `command`.
    ///
    /// `ERR` is accepted for every command since the server answers any
    /// request from an unknown endpoint with it.
    pub fn decode(command: Command, text: &str) -> Result<Self> {
        if text == MSG_ERROR {
            return Ok(Response::Err);
        }
        let response = match command {
            Command::Auth | Command::Tcp | Command::Xit if text == MSG_OK => {
                Response::Ok
            }
            Command::Lap => {
                Response::ActivePeers(split_list(text, RESP_NO_ACTIVE_PEERS))
            }
            Command::Lpf => Response::PublishedFiles(split_list(
                text,
                RESP_NO_PUBLISHED_FILES,
            )),
            Command::Sch => {
                Response::SearchResults(split_list(text, RESP_NO_FILES_FOUND))
            }
            Command::Pub if text == RESP_FILE_PUBLISHED => Response::Published,
            Command::Unp if text == RESP_FILE_UNPUBLISHED => {
                Response::Unpublished
            }
            Command::Unp if text == RESP_FILE_UNPUB_FAILED => {
                Response::UnpublishFailed
            }
            Command::Get if text == RESP_FILE_NOT_FOUND => {
                Response::FileNotFound
            }
            Command::Get if text == RESP_NO_ACTIVE_PEER_HAS_FILE => {
                Response::NoActivePeerHasFile
            }
            Command::Get => Response::Location(text.parse()?),
            _ => {
                return Err(ProtocolError::UnexpectedResponse {
                    command,
                    text: text.to_owned(),
                });
            }
        };
        Ok(response)
    }
}

fn split_list(text: &str, empty_marker: &str) -> Vec<String> {
    if text == empty_marker {
        return Vec::new();
    }
    text.split(LIST_SEPARATOR).map(str::to_owned).collect()
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    items: &[String],
    empty_marker: &str,
) -> fmt::Result {
    if items.is_empty() {
        f.write_str(empty_marker)
    } else {
        f.write_str(&items.join(LIST_SEPARATOR))
    }
}

/// Renders the exact wire text.
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => f.write_str(MSG_OK),
            Response::Err => f.write_str(MSG_ERROR),
            Response::ActivePeers(users) => {
                write_list(f, users, RESP_NO_ACTIVE_PEERS)
            }
            Response::PublishedFiles(files) => {
                write_list(f, files, RESP_NO_PUBLISHED_FILES)
            }
            Response::SearchResults(files) => {
                write_list(f, files, RESP_NO_FILES_FOUND)
            }
            Response::Published => f.write_str(RESP_FILE_PUBLISHED),
            Response::Unpublished => f.write_str(RESP_FILE_UNPUBLISHED),
            Response::UnpublishFailed => f.write_str(RESP_FILE_UNPUB_FAILED),
            Response::Location(location) => write!(f, "{location}"),
            Response::FileNotFound => f.write_str(RESP_FILE_NOT_FOUND),
            Response::NoActivePeerHasFile => {
                f.write_str(RESP_NO_ACTIVE_PEER_HAS_FILE)
            }
        }
    }
}
