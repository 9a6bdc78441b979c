use std::{net::SocketAddr, sync::Arc, time::Instant};

use peersync_entities::{CredentialStore, Session, SessionId};
use peersync_protocol::{Request, Response, is_valid_filename};

use crate::{
    DeparturePolicy, ServerConfig,
    catalog::{FileCatalog, ResolveError},
    registry::PeerRegistry,
};

/// Owns the registry and the catalog and turns each inbound datagram into at
/// most one response.
pub struct ControlHandler {
    registry: PeerRegistry,
    catalog: FileCatalog,
    on_departure: DeparturePolicy,
}

impl ControlHandler {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            registry: PeerRegistry::new(
                credentials,
                config.liveness_timeout(),
                config.duplicate_login,
            ),
            catalog: FileCatalog::new(),
            on_departure: config.on_departure,
        }
    }

    /// Processes one datagram from `from` received at `now`.
    ///
    /// Expired sessions are swept first. Returns `None` only for heartbeats,
    /// which are never answered.
    pub fn handle(
        &mut self,
        from: SocketAddr,
        datagram: &[u8],
        now: Instant,
    ) -> Option<Response> {
        let expired = self.registry.sweep_expired(now);
        self.depart(&expired);

        let request = match Request::parse(datagram) {
            Ok(request) => request,
            Err(err) => {
                log::warn!("{from} Received malformed request: {err}");
                log::info!("{from} Sent ERR to unknown client");
                return Some(Response::Err);
            }
        };
        let command = request.command().as_str().to_uppercase();

        if let Request::Auth { username, password } = &request {
            log::info!("{from} Received {command} from {username}");
            let response = self.authenticate(from, username, password, now);
            log::info!("{from} Sent {} to {username}", outcome(&response));
            return Some(response);
        }

        let session = match self.registry.touch(from, now) {
            Ok(session) => session,
            Err(err) => {
                log::warn!("{from} Received {command}: {err}");
                if request == Request::Heartbeat {
                    return None;
                }
                log::info!("{from} Sent ERR to unknown client");
                return Some(Response::Err);
            }
        };
        let username = self
            .registry
            .get(session)
            .map(|s| s.username.clone())
            .unwrap_or_default();
        log::info!("{from} Received {command} from {username}");

        if request == Request::Heartbeat {
            return None;
        }

        let response = self.dispatch(from, session, request);
        log::info!("{from} Sent {} to {username}", outcome(&response));
        log::debug!("{from} Response to {username}: {response}");
        Some(response)
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    fn authenticate(
        &mut self,
        from: SocketAddr,
        username: &str,
        password: &str,
        now: Instant,
    ) -> Response {
        match self.registry.authenticate(from, username, password, now) {
            Ok(authenticated) => {
                self.depart(&authenticated.displaced);
                Response::Ok
            }
            Err(err) => {
                log::warn!("{from} Authentication failed: {err}");
                Response::Err
            }
        }
    }

    fn dispatch(
        &mut self,
        from: SocketAddr,
        session: SessionId,
        request: Request,
    ) -> Response {
        match request {
            Request::TransferEndpoint(endpoint) => {
                match self.registry.register_transfer_endpoint(from, endpoint)
                {
                    Ok(()) => Response::Ok,
                    Err(_) => Response::Err,
                }
            }
            Request::ListActivePeers => {
                Response::ActivePeers(self.registry.list_active(from))
            }
            Request::ListPublishedFiles => {
                Response::PublishedFiles(self.catalog.list())
            }
            Request::Publish(filename) => {
                if !is_valid_filename(&filename) {
                    log::warn!("{from} Rejected filename {filename:?}");
                    return Response::Err;
                }
                self.catalog.publish(session, &filename);
                Response::Published
            }
            Request::Unpublish(filename) => {
                match self.catalog.unpublish(session, &filename) {
                    Ok(()) => Response::Unpublished,
                    Err(_) => Response::UnpublishFailed,
                }
            }
            Request::Search(needle) => {
                Response::SearchResults(self.catalog.search(&needle, session))
            }
            Request::Get(filename) => {
                match self.catalog.resolve(&filename, session, &self.registry) {
                    Ok(location) => Response::Location(location),
                    Err(ResolveError::NotFound) => Response::FileNotFound,
                    Err(ResolveError::NoActivePeer) => {
                        Response::NoActivePeerHasFile
                    }
                }
            }
            Request::Exit => match self.registry.logout(from) {
                Ok(session) => {
                    self.depart(&[session]);
                    Response::Ok
                }
                Err(_) => Response::Err,
            },
            // Answered in `handle` before a session is looked up.
            Request::Auth { .. } | Request::Heartbeat => Response::Err,
        }
    }

    fn depart(&mut self, sessions: &[Session]) {
        if self.on_departure == DeparturePolicy::Retain {
            return;
        }
        for session in sessions {
            let removed = self.catalog.remove_publisher(session.id);
            if removed > 0 {
                log::debug!(
                    "Unpublished {removed} file(s) of departed {}",
                    session.username
                );
            }
        }
    }
}

/// Audit-log status of a response.
fn outcome(response: &Response) -> &'static str {
    match response {
        Response::Err
        | Response::UnpublishFailed
        | Response::FileNotFound
        | Response::NoActivePeerHasFile => "ERR",
        _ => "OK",
    }
}
