//! Wire grammar of the PeerSync control channel.
//!
//! The control channel carries one UTF-8 line per datagram. A request is a
//! command word, optionally followed by a single space and its argument;
//! responses are fixed strings or `", "` joined lists. There is no escaping,
//! so filenames containing `", "` are ambiguous in list responses.
//!
//! This crate provides:
//! - [`Request`]: one variant per command, produced by [`Request::parse`] on
//!   the server and rendered by `Display` on the client.
//! - [`Response`]: one variant per reply, rendered by `Display` on the server
//!   and recovered by [`Response::decode`] on the client.
//! - [`PeerLocation`]: the `<user> <ip> <port>` answer to `get`.
//! - [`is_valid_filename`]: the naming rule for published files.
//!
//! Example:
//! ```
//! use peersync_protocol::{Command, Request, Response};
//!
//! let request = Request::parse(b"pub annual report.pdf").unwrap();
//! assert_eq!(request, Request::Publish("annual report.pdf".into()));
//!
//! let reply = Response::PublishedFiles(vec!["a.txt".into(), "b.txt".into()]);
//! assert_eq!(reply.to_string(), "a.txt, b.txt");
//! assert_eq!(Response::decode(Command::Lpf, "a.txt, b.txt").unwrap(), reply);
//! ```

#![deny(unsafe_code)]

mod error;
mod filename;
mod request;
mod response;

use std::time::Duration;

pub use error::{ProtocolError, Result};
pub use filename::{MAX_FILENAME_LENGTH, is_valid_filename};
pub use request::{Command, Request};
pub use response::{PeerLocation, Response};

/// Largest control request the server reads.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Largest control reply a peer reads. Listings are unbounded, so this is
/// the largest UDP payload.
pub const MAX_RESPONSE_SIZE: usize = 65507;

/// Size of every data-channel write except possibly the last one.
pub const CHUNK_SIZE: usize = 1024;

/// How often a peer emits `HBT`.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// Silence after which the server evicts a session. Must stay strictly
/// greater than [`HEARTBEAT_INTERVAL`].
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(3);

/// Minimum listen backlog for a peer's transfer socket.
pub const MIN_TRANSFER_BACKLOG: u32 = 10;

pub const MSG_OK: &str = "OK";
pub const MSG_ERROR: &str = "ERR";
pub const RESP_FILE_PUBLISHED: &str = "File published successfully";
pub const RESP_FILE_UNPUBLISHED: &str = "File unpublished successfully";
pub const RESP_FILE_UNPUB_FAILED: &str = "File unpublication failed";
pub const RESP_NO_ACTIVE_PEERS: &str = "No active peers";
pub const RESP_NO_PUBLISHED_FILES: &str = "No published files";
pub const RESP_NO_FILES_FOUND: &str = "No files found";
pub const RESP_FILE_NOT_FOUND: &str = "File not found";
pub const RESP_NO_ACTIVE_PEER_HAS_FILE: &str = "No active peer has this file";

/// Separator used by every list response.
pub const LIST_SEPARATOR: &str = ", ";
