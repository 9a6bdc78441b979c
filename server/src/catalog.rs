use peersync_entities::SessionId;
use peersync_protocol::PeerLocation;
use thiserror::Error;

use crate::registry::PeerRegistry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{filename} is not published by session {session}")]
pub struct NotPublished {
    pub session: SessionId,
    pub filename: String,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("File not found")]
    NotFound,
    #[error("No active peer has this file")]
    NoActivePeer,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    filename: String,
    /// Ordered by first publication, never empty.
    publishers: Vec<SessionId>,
}

/// Published filenames and the sessions offering each of them, kept in
/// first-publish order.
#[derive(Debug, Default)]
pub struct FileCatalog {
    entries: Vec<CatalogEntry>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `session` as a publisher of `filename`. Returns `false` when it
    /// already was one.
    pub fn publish(&mut self, session: SessionId, filename: &str) -> bool {
        match self.entry_mut(filename) {
            Some(entry) if entry.publishers.contains(&session) => false,
            Some(entry) => {
                entry.publishers.push(session);
                true
            }
            None => {
                self.entries.push(CatalogEntry {
                    filename: filename.to_owned(),
                    publishers: vec![session],
                });
                true
            }
        }
    }

    pub fn unpublish(
        &mut self,
        session: SessionId,
        filename: &str,
    ) -> Result<(), NotPublished> {
        let not_published = || NotPublished {
            session,
            filename: filename.to_owned(),
        };
        let index = self
            .entries
            .iter()
            .position(|e| e.filename == filename)
            .ok_or_else(not_published)?;

        let publishers = &mut self.entries[index].publishers;
        let slot = publishers
            .iter()
            .position(|p| *p == session)
            .ok_or_else(not_published)?;
        publishers.remove(slot);

        if publishers.is_empty() {
            self.entries.remove(index);
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.filename.clone()).collect()
    }

    /// Case-sensitive substring search. A name is skipped when `excluding`
    /// is its only publisher.
    pub fn search(&self, needle: &str, excluding: SessionId) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.filename.contains(needle))
            .filter(|e| e.publishers.iter().any(|p| *p != excluding))
            .map(|e| e.filename.clone())
            .collect()
    }

    /// Picks the first publisher of `filename`, in publication order, that is
    /// not `excluding`, is still live in `registry` and has announced a
    /// transfer endpoint.
    pub fn resolve(
        &self,
        filename: &str,
        excluding: SessionId,
        registry: &PeerRegistry,
    ) -> Result<PeerLocation, ResolveError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.filename == filename)
            .ok_or(ResolveError::NotFound)?;

        entry
            .publishers
            .iter()
            .filter(|id| **id != excluding)
            .filter_map(|id| registry.get(*id))
            .filter(|session| session.is_active())
            .find_map(|session| {
                session.transfer_endpoint.map(|endpoint| PeerLocation {
                    username: session.username.clone(),
                    endpoint,
                })
            })
            .ok_or(ResolveError::NoActivePeer)
    }

    /// Drops `session` from every publisher set, deleting entries left
    /// without publishers. Returns how many names it no longer publishes.
    pub fn remove_publisher(&mut self, session: SessionId) -> usize {
        let mut removed = 0;
        for entry in &mut self.entries {
            let before = entry.publishers.len();
            entry.publishers.retain(|p| *p != session);
            removed += before - entry.publishers.len();
        }
        self.entries.retain(|e| !e.publishers.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, filename: &str) -> Option<&mut CatalogEntry> {
        self.entries.iter_mut().find(|e| e.filename == filename)
    }
}
