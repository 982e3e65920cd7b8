//! Client session: the bearer token and the cached user record.
//!
//! Token and user are written together on sign-in and removed together on
//! sign-out. The server remains the only authority on whether a token is
//! still valid; nothing here tracks expiry.
//!
//! # Backends
//!
//! - [`FileSessionStore`] - persistent JSON file with the `token` and `user`
//!   entries
//! - [`MemorySessionStore`] - in-process store for tests and embedding

mod file;
mod memory;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::UserInfo;
use thiserror::Error;

use crate::error::{clear_sentry_user, set_sentry_user};

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// Keys of the persisted session entries.
pub mod keys {
    /// Key for the opaque bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the JSON-encoded user record.
    pub const USER: &str = "user";
}

/// Errors from writing session state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("server returned no usable session token")]
    BlankToken,
}

/// A snapshot of the session entries.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<SecretString>,
    pub user: Option<UserInfo>,
}

impl Session {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Storage backend for the session.
///
/// Reads never fail: unreadable or corrupt entries are treated as absent.
pub trait SessionStore: Send + Sync {
    /// Current token and user.
    fn get(&self) -> Session;

    /// Store a token and user together.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the entries cannot be written.
    fn set(&self, token: &SecretString, user: &UserInfo) -> Result<(), SessionError>;

    /// Replace the cached user, leaving the token untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the entry cannot be written.
    fn set_user(&self, user: &UserInfo) -> Result<(), SessionError>;

    /// Remove both entries.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the entries cannot be removed.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Tokens are opaque, but a blank or stringified-`undefined` value is
/// never a usable token.
fn usable_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && trimmed != "undefined" && trimmed != "null"
}

// =============================================================================
// SessionContext
// =============================================================================

/// The session as seen by one page load.
///
/// Constructed once by the host and passed into each controller. Cloning is
/// cheap and every clone sees the same store.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionContext {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Snapshot of both entries.
    #[must_use]
    pub fn session(&self) -> Session {
        self.store.get()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.store.get().token
    }

    #[must_use]
    pub fn user(&self) -> Option<UserInfo> {
        self.store.get().user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_authenticated()
    }

    /// Store a fresh token and user after login or registration.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::BlankToken` if the token is blank (the session
    /// is cleared instead), or another `SessionError` if the store cannot be
    /// written.
    pub fn sign_in(&self, token: &SecretString, user: &UserInfo) -> Result<(), SessionError> {
        if !usable_token(token.expose_secret()) {
            tracing::warn!("Refusing to store a blank session token");
            self.store.clear()?;
            return Err(SessionError::BlankToken);
        }
        self.store.set(token, user)?;
        if let Some(id) = &user.id {
            set_sentry_user(id, user.email.as_deref());
        }
        tracing::info!(user_id = ?user.id, "Session started");
        Ok(())
    }

    /// Replace the cached user. Failures are logged, never surfaced.
    pub fn update_user(&self, user: &UserInfo) {
        if let Err(e) = self.store.set_user(user) {
            tracing::warn!(error = %e, "Failed to update cached user");
        }
    }

    /// Remove token and user. Failures are logged, never surfaced.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear session");
        }
        clear_sentry_user();
    }
}
