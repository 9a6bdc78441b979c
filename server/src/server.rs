use std::{net::SocketAddr, sync::Arc};

use peersync_entities::{Clock, CredentialStore, SystemClock};
use peersync_protocol::MAX_DATAGRAM_SIZE;
use tokio::net::UdpSocket;

use crate::{Result, ServerConfig, handler::ControlHandler};

/// The UDP front of the coordination server.
///
/// A single task receives datagrams and feeds them to the
/// [`ControlHandler`] one at a time, so registry and catalog need no locks.
pub struct ControlServer {
    socket: UdpSocket,
    handler: ControlHandler,
    clock: Arc<dyn Clock>,
}

impl ControlServer {
    pub async fn bind(
        config: &ServerConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        config.validate()?;
        let socket = UdpSocket::bind(config.bind_addr()).await?;
        log::info!("Server started on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            handler: ControlHandler::new(credentials, config),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the wall clock used to timestamp datagrams.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Runs until the task is dropped. Transport errors are logged and the
    /// affected datagram is abandoned.
    pub async fn serve(mut self) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(err) => {
                    log::warn!("Failed to receive datagram: {err}");
                    continue;
                }
            };
            let now = self.clock.now();
            let Some(response) = self.handler.handle(from, &buf[..len], now)
            else {
                continue;
            };
            let wire = response.to_string();
            if let Err(err) = self.socket.send_to(wire.as_bytes(), from).await {
                log::warn!("Failed to send response to {from}: {err}");
            }
        }
    }
}
