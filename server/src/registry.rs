use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use peersync_entities::{CredentialStore, Session, SessionId, SessionState};
use thiserror::Error;

use crate::config::DuplicateLogin;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("User {0} is already logged in")]
    AlreadyLoggedIn(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No active session for {0}")]
pub struct UnknownSession(pub SocketAddr);

/// Outcome of a successful login.
#[derive(Debug)]
pub struct Authenticated {
    pub session: SessionId,
    /// Sessions removed to make room for the new one, either the previous
    /// session of the same endpoint or, under [`DuplicateLogin::Replace`],
    /// the username's session on another endpoint.
    pub displaced: Vec<Session>,
}

/// The set of live sessions, keyed by control endpoint.
///
/// Sessions are stored by id, so iteration follows login order.
pub struct PeerRegistry {
    credentials: Arc<dyn CredentialStore>,
    sessions: BTreeMap<SessionId, Session>,
    by_endpoint: HashMap<SocketAddr, SessionId>,
    next_session_id: SessionId,
    liveness_timeout: Duration,
    duplicate_login: DuplicateLogin,
}

impl PeerRegistry {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        liveness_timeout: Duration,
        duplicate_login: DuplicateLogin,
    ) -> Self {
        Self {
            credentials,
            sessions: BTreeMap::new(),
            by_endpoint: HashMap::new(),
            next_session_id: 1,
            liveness_timeout,
            duplicate_login,
        }
    }

    pub fn authenticate(
        &mut self,
        endpoint: SocketAddr,
        username: &str,
        password: &str,
        now: Instant,
    ) -> Result<Authenticated, AuthError> {
        if !self.credentials.verify(username, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let mut displaced = Vec::new();
        let elsewhere = self
            .sessions
            .values()
            .find(|s| s.username == username && s.control_endpoint != endpoint)
            .map(|s| s.control_endpoint);
        if let Some(other) = elsewhere {
            match self.duplicate_login {
                DuplicateLogin::Reject => {
                    return Err(AuthError::AlreadyLoggedIn(username.to_owned()));
                }
                DuplicateLogin::Replace => {
                    log::info!("{username} logged in again, dropping {other}");
                    displaced.extend(self.remove(other));
                }
            }
        }
        displaced.extend(self.remove(endpoint));

        let id = self.next_session_id;
        self.next_session_id += 1;
        self.sessions
            .insert(id, Session::new(id, endpoint, username.to_owned(), now));
        self.by_endpoint.insert(endpoint, id);

        Ok(Authenticated {
            session: id,
            displaced,
        })
    }

    /// Records liveness for the session of `endpoint`.
    pub fn touch(
        &mut self,
        endpoint: SocketAddr,
        now: Instant,
    ) -> Result<SessionId, UnknownSession> {
        let session = self.session_mut(endpoint)?;
        session.touch(now);
        Ok(session.id)
    }

    pub fn register_transfer_endpoint(
        &mut self,
        endpoint: SocketAddr,
        transfer: SocketAddr,
    ) -> Result<(), UnknownSession> {
        self.session_mut(endpoint)?.transfer_endpoint = Some(transfer);
        Ok(())
    }

    /// Usernames of every live session except the one at `excluding`.
    pub fn list_active(&self, excluding: SocketAddr) -> Vec<String> {
        self.sessions
            .values()
            .filter(|s| s.control_endpoint != excluding)
            .map(|s| s.username.clone())
            .collect()
    }

    /// Removes every session silent for strictly longer than the liveness
    /// timeout and returns them marked [`SessionState::Removed`].
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<Session> {
        let expired: Vec<SocketAddr> = self
            .sessions
            .values()
            .filter(|s| {
                now.saturating_duration_since(s.last_liveness)
                    > self.liveness_timeout
            })
            .map(|s| s.control_endpoint)
            .collect();

        expired
            .into_iter()
            .filter_map(|endpoint| self.remove(endpoint))
            .inspect(|s| {
                log::info!(
                    "Removed inactive client {} ({})",
                    s.username,
                    s.control_endpoint
                )
            })
            .collect()
    }

    pub fn logout(
        &mut self,
        endpoint: SocketAddr,
    ) -> Result<Session, UnknownSession> {
        self.remove(endpoint).ok_or(UnknownSession(endpoint))
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn session_at(&self, endpoint: SocketAddr) -> Option<&Session> {
        self.by_endpoint
            .get(&endpoint)
            .and_then(|id| self.sessions.get(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session_mut(
        &mut self,
        endpoint: SocketAddr,
    ) -> Result<&mut Session, UnknownSession> {
        self.by_endpoint
            .get(&endpoint)
            .and_then(|id| self.sessions.get_mut(id))
            .ok_or(UnknownSession(endpoint))
    }

    fn remove(&mut self, endpoint: SocketAddr) -> Option<Session> {
        let id = self.by_endpoint.remove(&endpoint)?;
        let mut session = self.sessions.remove(&id)?;
        session.state = SessionState::Removed;
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(3);

    fn credentials() -> Arc<dyn CredentialStore> {
        let mut store = HashMap::new();
        store.insert("alice".to_string(), "password123".to_string());
        store.insert("bob".to_string(), "secretpass".to_string());
        store.insert("charlie".to_string(), "mypass456".to_string());
        Arc::new(store)
    }

    fn registry(policy: DuplicateLogin) -> PeerRegistry {
        PeerRegistry::new(credentials(), TIMEOUT, policy)
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn wrong_password_creates_no_session() {
        let mut registry = registry(DuplicateLogin::Reject);
        let result =
            registry.authenticate(addr(1), "alice", "nope", Instant::now());

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_user_is_rejected() {
        let mut registry = registry(DuplicateLogin::Reject);
        let result =
            registry.authenticate(addr(1), "mallory", "x", Instant::now());

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[test]
    fn session_ids_increase_and_are_never_reused() {
        let mut registry = registry(DuplicateLogin::Reject);
        let now = Instant::now();

        let first = registry
            .authenticate(addr(1), "alice", "password123", now)
            .unwrap();
        let again = registry
            .authenticate(addr(1), "alice", "password123", now)
            .unwrap();

        assert!(again.session > first.session);
        assert_eq!(again.displaced.len(), 1);
        assert_eq!(again.displaced[0].id, first.session);
        assert_eq!(again.displaced[0].state, SessionState::Removed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_username_is_rejected_by_default() {
        let mut registry = registry(DuplicateLogin::Reject);
        let now = Instant::now();
        registry
            .authenticate(addr(1), "alice", "password123", now)
            .unwrap();

        let second =
            registry.authenticate(addr(2), "alice", "password123", now);

        assert_eq!(
            second.unwrap_err(),
            AuthError::AlreadyLoggedIn("alice".into())
        );
        assert!(registry.session_at(addr(1)).is_some());
        assert!(registry.session_at(addr(2)).is_none());
    }

    #[test]
    fn duplicate_username_replaces_old_session_when_configured() {
        let mut registry = registry(DuplicateLogin::Replace);
        let now = Instant::now();
        let first = registry
            .authenticate(addr(1), "alice", "password123", now)
            .unwrap();

        let second = registry
            .authenticate(addr(2), "alice", "password123", now)
            .unwrap();

        assert_eq!(second.displaced.len(), 1);
        assert_eq!(second.displaced[0].id, first.session);
        assert!(registry.session_at(addr(1)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn touch_and_register_require_a_session() {
        let mut registry = registry(DuplicateLogin::Reject);
        let now = Instant::now();

        assert_eq!(registry.touch(addr(9), now), Err(UnknownSession(addr(9))));
        assert_eq!(
            registry.register_transfer_endpoint(addr(9), addr(5000)),
            Err(UnknownSession(addr(9)))
        );
    }

    #[test]
    fn transfer_endpoint_is_overwritten() {
        let mut registry = registry(DuplicateLogin::Reject);
        let session = registry
            .authenticate(addr(1), "bob", "secretpass", Instant::now())
            .unwrap()
            .session;

        registry
            .register_transfer_endpoint(addr(1), addr(5000))
            .unwrap();
        registry
            .register_transfer_endpoint(addr(1), addr(6000))
            .unwrap();

        assert_eq!(
            registry.get(session).unwrap().transfer_endpoint,
            Some(addr(6000))
        );
    }

    #[test]
    fn list_active_excludes_requester_in_login_order() {
        let mut registry = registry(DuplicateLogin::Reject);
        let now = Instant::now();
        for (port, user, pass) in [
            (3, "charlie", "mypass456"),
            (1, "alice", "password123"),
            (2, "bob", "secretpass"),
        ] {
            registry.authenticate(addr(port), user, pass, now).unwrap();
        }

        assert_eq!(registry.list_active(addr(1)), vec!["charlie", "bob"]);
    }

    #[test]
    fn sweep_removes_only_sessions_strictly_past_timeout() {
        let mut registry = registry(DuplicateLogin::Reject);
        let start = Instant::now();
        registry
            .authenticate(addr(1), "alice", "password123", start)
            .unwrap();
        registry
            .authenticate(addr(2), "bob", "secretpass", start)
            .unwrap();
        registry.touch(addr(2), start + Duration::from_secs(2)).unwrap();

        assert!(registry.sweep_expired(start + TIMEOUT).is_empty());

        let removed =
            registry.sweep_expired(start + TIMEOUT + Duration::from_millis(1));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].username, "alice");
        assert_eq!(removed[0].state, SessionState::Removed);
        assert_eq!(registry.list_active(addr(9)), vec!["bob"]);
    }

    #[test]
    fn touch_with_older_timestamp_keeps_session_alive() {
        let mut registry = registry(DuplicateLogin::Reject);
        let start = Instant::now();
        registry
            .authenticate(addr(1), "alice", "password123", start)
            .unwrap();
        registry.touch(addr(1), start + Duration::from_secs(2)).unwrap();
        registry.touch(addr(1), start).unwrap();

        assert!(
            registry.sweep_expired(start + Duration::from_secs(4)).is_empty()
        );
    }

    #[test]
    fn logout_removes_the_session() {
        let mut registry = registry(DuplicateLogin::Reject);
        registry
            .authenticate(addr(1), "alice", "password123", Instant::now())
            .unwrap();

        let session = registry.logout(addr(1)).unwrap();

        assert_eq!(session.username, "alice");
        assert!(registry.is_empty());
        assert_eq!(
            registry.logout(addr(1)).unwrap_err(),
            UnknownSession(addr(1))
        );
    }
}
