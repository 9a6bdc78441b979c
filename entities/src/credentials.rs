use std::collections::HashMap;

/// A read-only `username -> password` lookup.
///
/// Implementors must be `Send + Sync` so a store can be shared with the
/// server task behind an `Arc`.
pub trait CredentialStore: Send + Sync {
    /// Returns the password registered for `username`, if any.
    fn lookup(&self, username: &str) -> Option<&str>;

    /// Checks `password` against the registered one.
    fn verify(&self, username: &str, password: &str) -> bool {
        self.lookup(username) == Some(password)
    }
}

impl CredentialStore for HashMap<String, String> {
    fn lookup(&self, username: &str) -> Option<&str> {
        self.get(username).map(String::as_str)
    }
}
