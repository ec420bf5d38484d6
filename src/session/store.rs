//! On-disk persistence for the session pair.
//!
//! Exactly two entries survive a restart: the bearer token and the
//! serialized identity. They are written and cleared together - a pair with
//! only one half present is an invalid state and is treated as logged out
//! (and removed). Corrupt identity data self-heals the same way: clear
//! both, report absent, never fail.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::identity::Identity;

const TOKEN_FILE: &str = "token";
const IDENTITY_FILE: &str = "identity.json";

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist both entries. Each file lands via temp-file-then-rename so a
    /// concurrent reader never observes a half-written entry.
    pub fn save(&self, token: &str, identity: &Identity) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let serialized = serde_json::to_string(identity)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.write_entry(IDENTITY_FILE, serialized.as_bytes())?;
        self.write_entry(TOKEN_FILE, token.as_bytes())?;
        debug!(dir = %self.dir.display(), "session persisted");
        Ok(())
    }

    /// Rewrite the identity entry only; the token is immutable once issued.
    pub fn update_identity(&self, identity: &Identity) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let serialized = serde_json::to_string(identity)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.write_entry(IDENTITY_FILE, serialized.as_bytes())
    }

    /// Read the persisted session, or `None` when there is no usable one.
    pub fn load(&self) -> Option<(String, Identity)> {
        let token = read_entry(&self.dir.join(TOKEN_FILE));
        let identity_raw = read_entry(&self.dir.join(IDENTITY_FILE));

        let (token, identity_raw) = match (token, identity_raw) {
            (Some(token), Some(raw)) if !token.is_empty() => (token, raw),
            (None, None) => return None,
            _ => {
                // A dangling token with no identity (or vice versa) is not a
                // session.
                warn!("session store held a partial session, clearing it");
                self.clear();
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&identity_raw) {
            Ok(identity) => Some((token, identity)),
            Err(err) => {
                warn!(error = %err, "stored identity is corrupt, clearing session");
                self.clear();
                None
            }
        }
    }

    /// Remove both entries. Missing files are fine; logout is idempotent.
    pub fn clear(&self) {
        for name in [TOKEN_FILE, IDENTITY_FILE] {
            let path = self.dir.join(name);
            if let Err(err) = fs::remove_file(&path) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %err, "failed to remove session entry");
                }
            }
        }
    }

    fn write_entry(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.dir.join(name)).map_err(|err| err.error)?;
        Ok(())
    }
}

fn read_entry(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read session entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn identity() -> Identity {
        Identity {
            id: "u1".to_string(),
            email: "jo@example.com".to_string(),
            name: "Jo Farah".to_string(),
            role: Role::Agent,
            company: Some("Acme LLC".to_string()),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("tok-123", &identity()).unwrap();
        let (token, loaded) = store.load().unwrap();
        assert_eq!(token, "tok-123");
        assert_eq!(loaded, identity());
    }

    #[test]
    fn test_load_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_identity_self_heals() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        fs::write(dir.path().join(TOKEN_FILE), "tok-123").unwrap();
        fs::write(dir.path().join(IDENTITY_FILE), "{not json").unwrap();

        assert!(store.load().is_none());
        // Both entries are gone as a side effect.
        assert!(!dir.path().join(TOKEN_FILE).exists());
        assert!(!dir.path().join(IDENTITY_FILE).exists());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_dangling_token_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        fs::write(dir.path().join(TOKEN_FILE), "tok-123").unwrap();
        assert!(store.load().is_none());
        assert!(!dir.path().join(TOKEN_FILE).exists());
    }

    #[test]
    fn test_dangling_identity_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("tok-123", &identity()).unwrap();
        fs::remove_file(dir.path().join(TOKEN_FILE)).unwrap();

        assert!(store.load().is_none());
        assert!(!dir.path().join(IDENTITY_FILE).exists());
    }

    #[test]
    fn test_empty_token_is_not_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        fs::write(dir.path().join(TOKEN_FILE), "").unwrap();
        fs::write(
            dir.path().join(IDENTITY_FILE),
            serde_json::to_string(&identity()).unwrap(),
        )
        .unwrap();

        assert!(store.load().is_none());
        assert!(!dir.path().join(IDENTITY_FILE).exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("tok-123", &identity()).unwrap();
        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_update_identity_keeps_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("tok-123", &identity()).unwrap();
        let mut updated = identity();
        updated.name = "Jo F.".to_string();
        store.update_identity(&updated).unwrap();

        let (token, loaded) = store.load().unwrap();
        assert_eq!(token, "tok-123");
        assert_eq!(loaded.name, "Jo F.");
    }
}
