//! File-backed session store.
//!
//! The file is a flat JSON object of string entries, the same shape a
//! browser's local storage would hold:
//!
//! ```json
//! { "token": "eyJhbGciOi...", "user": "{\"id\":7,\"role\":\"customer\"}" }
//! ```
//!
//! The `user` entry is itself JSON-encoded.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::UserInfo;

use super::{Session, SessionError, SessionStore, keys, usable_token};

type Entries = BTreeMap<String, String>;

/// Session store persisted to a JSON file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Entries {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Entries::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return Entries::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
            Entries::new()
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), SessionError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Session {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries();

        let token = entries
            .get(keys::TOKEN)
            .filter(|t| usable_token(t))
            .map(|t| SecretString::from(t.as_str()));

        let user = match entries.get(keys::USER) {
            None => None,
            Some(raw) => match serde_json::from_str::<UserInfo>(raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Clearing invalid cached user");
                    entries.remove(keys::USER);
                    if let Err(e) = self.write_entries(&entries) {
                        tracing::warn!(error = %e, "Failed to rewrite session file");
                    }
                    None
                }
            },
        };

        Session { token, user }
    }

    fn set(&self, token: &SecretString, user: &UserInfo) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries();
        entries.insert(keys::TOKEN.to_string(), token.expose_secret().to_string());
        entries.insert(keys::USER.to_string(), serde_json::to_string(user)?);
        self.write_entries(&entries)
    }

    fn set_user(&self, user: &UserInfo) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries();
        entries.insert(keys::USER.to_string(), serde_json::to_string(user)?);
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries();
        entries.remove(keys::TOKEN);
        entries.remove(keys::USER);
        self.write_entries(&entries)
    }
}
