use std::{collections::HashMap, fs, path::Path};

use peersync_entities::CredentialStore;

use crate::{Result, ServerError};

/// Credentials loaded from a text file with one `username password` pair
/// per line. Blank lines and lines starting with `#` are skipped.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    entries: HashMap<String, String>,
}

impl Credentials {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|source| ServerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&contents).map_err(|line| ServerError::CredentialFormat {
            path: path.to_path_buf(),
            line,
        })
    }

    /// Parses file contents. On failure returns the 1-based number of the
    /// offending line.
    pub fn parse(contents: &str) -> std::result::Result<Self, usize> {
        let mut entries = HashMap::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split(' ');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(user), Some(pass), None)
                    if !user.is_empty() && !pass.is_empty() =>
                {
                    entries.insert(user.to_owned(), pass.to_owned());
                }
                _ => return Err(index + 1),
            }
        }
        log::debug!("Loaded {} credential(s)", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for Credentials {
    fn lookup(&self, username: &str) -> Option<&str> {
        self.entries.get(username).map(String::as_str)
    }
}
