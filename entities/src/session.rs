use std::{net::SocketAddr, time::Instant};

/// Server-assigned session identifier.
///
/// Identifiers are never reused: an endpoint that authenticates again gets a
/// fresh one.
pub type SessionId = u64;

/// Lifecycle of a session.
///
/// A session is materialized already `Active` on successful authentication;
/// `Removed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Removed,
}

/// One authenticated client.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: SessionId,
    /// Address the session authenticated from. Immutable.
    pub control_endpoint: SocketAddr,
    pub username: String,
    /// Data-channel address, absent until the client registers it.
    pub transfer_endpoint: Option<SocketAddr>,
    /// Timestamp of the most recently accepted message.
    pub last_liveness: Instant,
    pub state: SessionState,
}

impl Session {
    pub fn new(
        id: SessionId,
        control_endpoint: SocketAddr,
        username: String,
        now: Instant,
    ) -> Self {
        Self {
            id,
            control_endpoint,
            username,
            transfer_endpoint: None,
            last_liveness: now,
            state: SessionState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Records liveness at `now`. Never moves the timestamp backwards.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_liveness {
            self.last_liveness = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn touch_never_moves_backwards() {
        let start = Instant::now();
        let mut session = Session::new(
            7,
            "127.0.0.1:4000".parse().unwrap(),
            "bob".into(),
            start + Duration::from_secs(5),
        );

        session.touch(start);
        assert_eq!(session.last_liveness, start + Duration::from_secs(5));

        session.touch(start + Duration::from_secs(6));
        assert_eq!(session.last_liveness, start + Duration::from_secs(6));
    }
}
