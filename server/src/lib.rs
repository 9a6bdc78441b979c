//! PeerSync coordination server.
//!
//! The server authenticates peers over a UDP control channel, tracks their
//! liveness and transfer endpoints, and keeps a catalog of the files each of
//! them publishes. It never carries file data: a successful `get` hands the
//! requester the publisher's transfer endpoint and the two peers talk
//! directly.
//!
//! This crate provides:
//! - [`PeerRegistry`]: live sessions keyed by control endpoint, with the
//!   liveness sweep.
//! - [`FileCatalog`]: published filenames and their publishers.
//! - [`ControlHandler`]: parses a datagram, sweeps, dispatches, answers.
//! - [`ControlServer`]: the tokio UDP loop in front of the handler.
//! - [`Credentials`] and [`ServerConfig`]: file-backed settings.
//!
//! Example:
//! ```no_run
//! use std::sync::Arc;
//!
//! use peersync_server::{ControlServer, Credentials, ServerConfig};
//!
//! # async fn demo() -> peersync_server::Result<()> {
//! let config = ServerConfig::load("config/server.toml")?;
//! let credentials = Credentials::load(&config.credentials)?;
//! let server = ControlServer::bind(&config, Arc::new(credentials)).await?;
//! server.serve().await
//! # }
//! ```

mod catalog;
mod config;
mod credentials;
mod error;
mod handler;
mod registry;
mod server;

pub use catalog::{FileCatalog, NotPublished, ResolveError};
pub use config::{DeparturePolicy, DuplicateLogin, ServerConfig};
pub use credentials::Credentials;
pub use error::{Result, ServerError};
pub use handler::ControlHandler;
pub use registry::{AuthError, Authenticated, PeerRegistry, UnknownSession};
pub use server::ControlServer;
