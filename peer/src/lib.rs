//! PeerSync peer.
//!
//! A peer talks to the coordination server over the UDP control channel and
//! exchanges file contents with other peers over direct TCP connections.
//!
//! This crate provides:
//! - [`ControlClient`]: typed requests to the server plus the heartbeat task.
//! - [`TransferServer`]: the acceptor that streams files out of a
//!   [`SharedDirectory`].
//! - [`download`]: the requesting side of a transfer.
//! - [`PeerConfig`]: TOML-backed settings.
//!
//! Example:
//! ```no_run
//! use std::time::Duration;
//!
//! use peersync_peer::{
//!     ControlClient, Located, SharedDirectory, TransferServer,
//! };
//!
//! # async fn demo() -> peersync_peer::Result<()> {
//! let shared = SharedDirectory::new("shared");
//! let transfer =
//!     TransferServer::bind("127.0.0.1:0".parse().unwrap(), 10, shared)?;
//! let client = ControlClient::connect("127.0.0.1:5000").await?;
//! client.authenticate("alice", "password123").await?;
//! client.register_transfer_endpoint(transfer.local_addr()?).await?;
//! let _heartbeat = client.spawn_heartbeat(Duration::from_secs(2));
//! tokio::spawn(transfer.serve());
//!
//! if let Located::Peer(location) = client.locate("notes.txt").await? {
//!     peersync_peer::download(
//!         location.endpoint,
//!         "notes.txt",
//!         "downloads/notes.txt".as_ref(),
//!     )
//!     .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod control;
mod error;
mod transfer;

pub use config::PeerConfig;
pub use control::{ControlClient, Located};
pub use error::{PeerError, Result};
pub use transfer::{SharedDirectory, TransferServer, download};
