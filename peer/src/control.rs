use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use peersync_protocol::{
    MAX_RESPONSE_SIZE, PeerLocation, ProtocolError, Request, Response,
    is_valid_filename,
};
use tokio::{
    net::{UdpSocket, lookup_host},
    task::JoinHandle,
};

use crate::{PeerError, Result};

/// Answer to a file lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Located {
    Peer(PeerLocation),
    FileNotFound,
    NoActivePeer,
}

/// Client side of the control channel.
///
/// Requests are sent one at a time and each waits for its single reply.
/// There is no response timeout. The socket is shared with the heartbeat
/// task, which only sends.
#[derive(Clone)]
pub struct ControlClient {
    socket: Arc<UdpSocket>,
}

impl ControlClient {
    /// Binds an ephemeral local port and connects it to `server`.
    pub async fn connect(server: &str) -> Result<Self> {
        let server = lookup_host(server).await?.next().ok_or_else(|| {
            PeerError::Config(format!("cannot resolve server {server}"))
        })?;
        let local: IpAddr = match server {
            SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
            SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
        };
        let socket = UdpSocket::bind(SocketAddr::new(local, 0)).await?;
        socket.connect(server).await?;
        log::debug!("Control channel {} -> {server}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let request = Request::Auth {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        match self.request(&request).await? {
            Response::Ok => Ok(()),
            _ => Err(PeerError::AuthenticationFailed),
        }
    }

    /// Announces where this peer accepts transfer connections.
    pub async fn register_transfer_endpoint(
        &self,
        endpoint: SocketAddr,
    ) -> Result<()> {
        let request = Request::TransferEndpoint(endpoint);
        match self.request(&request).await? {
            Response::Ok => Ok(()),
            _ => Err(PeerError::Rejected(request.command())),
        }
    }

    pub async fn list_active_peers(&self) -> Result<Vec<String>> {
        match self.request(&Request::ListActivePeers).await? {
            Response::ActivePeers(users) => Ok(users),
            _ => Err(PeerError::Rejected(Request::ListActivePeers.command())),
        }
    }

    pub async fn list_published_files(&self) -> Result<Vec<String>> {
        match self.request(&Request::ListPublishedFiles).await? {
            Response::PublishedFiles(files) => Ok(files),
            _ => Err(PeerError::Rejected(
                Request::ListPublishedFiles.command(),
            )),
        }
    }

    pub async fn publish(&self, filename: &str) -> Result<()> {
        if !is_valid_filename(filename) {
            return Err(PeerError::InvalidFilename(filename.to_owned()));
        }
        let request = Request::Publish(filename.to_owned());
        match self.request(&request).await? {
            Response::Published => Ok(()),
            _ => Err(PeerError::Rejected(request.command())),
        }
    }

    /// Returns `false` when the server reports that this peer was not
    /// publishing `filename`.
    pub async fn unpublish(&self, filename: &str) -> Result<bool> {
        let request = Request::Unpublish(filename.to_owned());
        match self.request(&request).await? {
            Response::Unpublished => Ok(true),
            Response::UnpublishFailed => Ok(false),
            _ => Err(PeerError::Rejected(request.command())),
        }
    }

    pub async fn search(&self, needle: &str) -> Result<Vec<String>> {
        let request = Request::Search(needle.to_owned());
        match self.request(&request).await? {
            Response::SearchResults(files) => Ok(files),
            _ => Err(PeerError::Rejected(request.command())),
        }
    }

    /// Asks the server which peer can serve `filename`.
    pub async fn locate(&self, filename: &str) -> Result<Located> {
        let request = Request::Get(filename.to_owned());
        match self.request(&request).await? {
            Response::Location(location) => Ok(Located::Peer(location)),
            Response::FileNotFound => Ok(Located::FileNotFound),
            Response::NoActivePeerHasFile => Ok(Located::NoActivePeer),
            _ => Err(PeerError::Rejected(request.command())),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        match self.request(&Request::Exit).await? {
            Response::Ok => Ok(()),
            _ => Err(PeerError::Rejected(Request::Exit.command())),
        }
    }

    /// Sends `HBT` every `interval` until the returned task is aborted. The
    /// first heartbeat goes out immediately.
    pub fn spawn_heartbeat(&self, interval: Duration) -> JoinHandle<()> {
        let socket = self.socket.clone();
        let heartbeat = Request::Heartbeat.to_string();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = socket.send(heartbeat.as_bytes()).await {
                    log::warn!("Failed to send heartbeat: {err}");
                }
            }
        })
    }

    async fn request(&self, request: &Request) -> Result<Response> {
        self.socket.send(request.to_string().as_bytes()).await?;

        let mut buf = vec![0u8; MAX_RESPONSE_SIZE];
        let len = self.socket.recv(&mut buf).await?;
        let text = std::str::from_utf8(&buf[..len])
            .map_err(|_| ProtocolError::NotUtf8)?;
        log::trace!("{} -> {text:?}", request.command());
        Ok(Response::decode(request.command(), text)?)
    }
}
