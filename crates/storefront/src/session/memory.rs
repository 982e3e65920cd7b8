//! In-process session store.

use std::sync::{Mutex, PoisonError};

use secrecy::SecretString;
use shopfront_core::UserInfo;

use super::{Session, SessionError, SessionStore};

/// Session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Session>,
}

impl MemorySessionStore {
    /// A store that starts out signed in.
    #[must_use]
    pub fn signed_in(token: &str, user: UserInfo) -> Self {
        Self {
            session: Mutex::new(Session {
                token: Some(SecretString::from(token)),
                user: Some(user),
            }),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Session {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: &SecretString, user: &UserInfo) -> Result<(), SessionError> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        session.token = Some(token.clone());
        session.user = Some(user.clone());
        Ok(())
    }

    fn set_user(&self, user: &UserInfo) -> Result<(), SessionError> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .user = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Session::default();
        Ok(())
    }
}
