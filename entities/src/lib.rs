//! Minimal models shared by the PeerSync coordination server and its peers.
//!
//! This crate provides:
//! - `Session`: one authenticated client as seen by the server, keyed by the
//!   control endpoint it authenticated from.
//! - `CredentialStore`: a read-only `username -> password` lookup.
//! - `Clock`: a source of monotonic timestamps, so liveness can be driven by
//!   a fake clock in tests.
//!
//! Example (illustrative):
//! ```rust
//! use std::collections::HashMap;
//! use std::time::Instant;
//!
//! use peersync_entities::{CredentialStore, Session, SessionState};
//!
//! let mut credentials = HashMap::new();
//! credentials.insert("alice".to_string(), "password123".to_string());
//! assert_eq!(credentials.lookup("alice"), Some("password123"));
//! assert_eq!(credentials.lookup("mallory"), None);
//!
//! let session = Session::new(
//!     1,
//!     "127.0.0.1:40000".parse().unwrap(),
//!     "alice".into(),
//!     Instant::now(),
//! );
//! assert_eq!(session.state, SessionState::Active);
//! assert!(session.transfer_endpoint.is_none());
//! ```

mod clock;
mod credentials;
mod session;

/// Re-export of the timestamp source.
pub use clock::{Clock, SystemClock};
/// Re-export of the credential lookup.
pub use credentials::CredentialStore;
/// Re-export of the session model.
pub use session::{Session, SessionId, SessionState};
