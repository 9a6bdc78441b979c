//! Command line front ends for PeerSync.
//!
//! This library backs two binaries:
//! - `peersync-server`: loads credentials and runs the coordination server.
//! - `peersync-client`: logs a peer in, serves its shared directory and runs
//!   the interactive command loop (`lap`, `lpf`, `pub`, `unp`, `sch`, `get`,
//!   `xit`).
//!
//! Both accept an optional TOML file via `--config`; flags given on the
//! command line override values from the file.

mod shell;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use peersync_peer::{ControlClient, PeerConfig, SharedDirectory, TransferServer};
use peersync_server::{ControlServer, Credentials, ServerConfig};
use tokio::io::{AsyncBufRead, BufReader};

pub use shell::Shell;

/// Arguments of `peersync-server`.
#[derive(Parser, Debug, Default)]
#[command(name = "peersync-server", version)]
#[command(about = "PeerSync coordination server", long_about = None)]
pub struct ServerArgs {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Address to bind the control channel to.
    #[arg(long)]
    pub host: Option<String>,
    /// UDP port of the control channel.
    #[arg(long, short)]
    pub port: Option<u16>,
    /// File with one `username password` pair per line.
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,
}

impl ServerArgs {
    /// Configuration file values with command line overrides applied.
    pub fn resolve(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path).with_context(|| {
                format!("Failed to load config file: {}", path.display())
            })?,
            None => ServerConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(credentials) = &self.credentials {
            config.credentials = credentials.clone();
        }
        config.validate().context("Invalid server configuration")?;
        Ok(config)
    }
}

/// Arguments of `peersync-client`.
#[derive(Parser, Debug, Default)]
#[command(name = "peersync-client", version)]
#[command(about = "PeerSync peer client", long_about = None)]
pub struct ClientArgs {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Control endpoint of the server, `host:port`.
    #[arg(long, value_name = "ADDR")]
    pub server: Option<String>,
    /// Directory whose files are offered to other peers.
    #[arg(long, value_name = "DIR")]
    pub shared_dir: Option<PathBuf>,
    /// Directory downloads are written to.
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}

impl ClientArgs {
    pub fn resolve(&self) -> Result<PeerConfig> {
        let mut config = match &self.config {
            Some(path) => PeerConfig::load(path).with_context(|| {
                format!("Failed to load config file: {}", path.display())
            })?,
            None => PeerConfig::default(),
        };
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(dir) = &self.shared_dir {
            config.shared_dir = dir.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        config.validate().context("Invalid client configuration")?;
        Ok(config)
    }
}

/// Runs the coordination server until the process is stopped.
pub async fn run_server(args: ServerArgs) -> Result<()> {
    let config = args.resolve()?;
    let credentials =
        Credentials::load(&config.credentials).with_context(|| {
            format!(
                "Failed to load credentials: {}",
                config.credentials.display()
            )
        })?;
    log::info!("Loaded {} user(s)", credentials.len());

    let server = ControlServer::bind(&config, Arc::new(credentials))
        .await
        .with_context(|| {
            format!("Failed to bind control channel on {}", config.bind_addr())
        })?;
    println!("Server is running on {}", server.local_addr()?);
    server.serve().await?;
    Ok(())
}

/// Runs an interactive peer reading from standard input.
pub async fn run_client(args: ClientArgs) -> Result<()> {
    let config = args.resolve()?;
    let input = BufReader::new(tokio::io::stdin());
    run_client_with(config, input).await
}

/// Runs a peer session driven by `input`.
pub async fn run_client_with<R>(config: PeerConfig, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    std::fs::create_dir_all(&config.download_dir).with_context(|| {
        format!(
            "Failed to create download directory: {}",
            config.download_dir.display()
        )
    })?;

    let transfer_addr = tokio::net::lookup_host(config.transfer_addr())
        .await?
        .next()
        .with_context(|| {
            format!(
                "Cannot resolve transfer address {}",
                config.transfer_addr()
            )
        })?;
    let shared = SharedDirectory::new(&config.shared_dir);
    let transfer =
        TransferServer::bind(transfer_addr, config.backlog, shared.clone())
            .context("Failed to open transfer listener")?
            .with_chunk_size(config.chunk_size);

    let client = ControlClient::connect(&config.server)
        .await
        .with_context(|| format!("Failed to reach server {}", config.server))?;

    let mut shell =
        Shell::new(client, shared, config.download_dir.clone(), input);
    if !shell.login().await? {
        return Ok(());
    }

    shell
        .client()
        .register_transfer_endpoint(transfer.local_addr()?)
        .await
        .context("Failed to register transfer endpoint")?;
    let heartbeat = shell.client().spawn_heartbeat(config.heartbeat_interval());
    let acceptor = tokio::spawn(transfer.serve());

    let result = shell.run().await;

    heartbeat.abort();
    acceptor.abort();
    result
}
