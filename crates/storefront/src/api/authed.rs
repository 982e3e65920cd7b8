//! Calls that require a bearer token, with one policy for 401 responses.
//!
//! Every authenticated call goes through [`Authed::run`]:
//!
//! - no token in the session: no request is sent, [`AuthedError::LoginRequired`]
//! - 401 under [`UnauthorizedPolicy::ForceLogout`]: the session is cleared,
//!   [`AuthedError::SessionExpired`]
//! - 401 under [`UnauthorizedPolicy::ProfileFallback`]: the session is left
//!   alone, [`AuthedError::Unauthorized`], and the caller decides
//!
//! The `redirect` carried by the first two points back at the page that made
//! the call.

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;
use url::form_urlencoded;

use super::ApiError;
use crate::session::SessionContext;

/// What to do when the server rejects the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnauthorizedPolicy {
    /// Clear the session and send the user to the login page.
    #[default]
    ForceLogout,
    /// Leave the session alone so the caller can try the user-info lookup.
    ProfileFallback,
}

/// Outcome of an authenticated call that did not succeed.
#[derive(Debug, Error)]
pub enum AuthedError {
    /// No token in the session; nothing was sent.
    #[error("login required")]
    LoginRequired { redirect: String },

    /// The server rejected the token and the session has been cleared.
    #[error("session expired")]
    SessionExpired { redirect: String },

    /// The server rejected the token; the session was not touched.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Login page URL that returns to `return_to` afterwards.
///
/// ```
/// use shopfront_storefront::api::authed::login_url;
///
/// assert_eq!(login_url("/cart"), "/login?redirect=/cart");
/// assert_eq!(login_url("/products?page=2"), "/login?redirect=/products%3Fpage%3D2");
/// ```
#[must_use]
pub fn login_url(return_to: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(return_to.as_bytes())
        .collect::<String>()
        // '/' is legal in a query value.
        .replace("%2F", "/");
    format!("/login?redirect={encoded}")
}

/// Runs calls with the session's token under an [`UnauthorizedPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct Authed<'a> {
    session: &'a SessionContext,
    return_to: &'a str,
    policy: UnauthorizedPolicy,
}

impl<'a> Authed<'a> {
    /// Calls made from the page at `return_to`, under `ForceLogout`.
    #[must_use]
    pub const fn new(session: &'a SessionContext, return_to: &'a str) -> Self {
        Self {
            session,
            return_to,
            policy: UnauthorizedPolicy::ForceLogout,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: UnauthorizedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run `call` with the current token.
    ///
    /// # Errors
    ///
    /// Returns `AuthedError` as described in the module docs.
    pub async fn run<T, F, Fut>(&self, call: F) -> Result<T, AuthedError>
    where
        F: FnOnce(SecretString) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Some(token) = self.session.token() else {
            return Err(AuthedError::LoginRequired {
                redirect: login_url(self.return_to),
            });
        };

        match call(token).await {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized) => match self.policy {
                UnauthorizedPolicy::ForceLogout => {
                    tracing::info!(return_to = self.return_to, "Session rejected by server");
                    self.session.clear();
                    Err(AuthedError::SessionExpired {
                        redirect: login_url(self.return_to),
                    })
                }
                UnauthorizedPolicy::ProfileFallback => Err(AuthedError::Unauthorized),
            },
            Err(e) => Err(AuthedError::Api(e)),
        }
    }

    /// Clear the session and report it expired. Used by callers that handled
    /// `Unauthorized` themselves and gave up.
    #[must_use]
    pub fn expire(&self) -> AuthedError {
        self.session.clear();
        AuthedError::SessionExpired {
            redirect: login_url(self.return_to),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use shopfront_core::UserInfo;

    use super::*;
    use crate::session::MemorySessionStore;

    fn signed_in() -> SessionContext {
        SessionContext::new(Arc::new(MemorySessionStore::signed_in(
            "tok",
            UserInfo::default(),
        )))
    }

    #[tokio::test]
    async fn test_no_token_sends_nothing() {
        let session = SessionContext::new(Arc::new(MemorySessionStore::default()));
        let called = AtomicBool::new(false);

        let result = Authed::new(&session, "/cart")
            .run(|_| async {
                called.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(AuthedError::LoginRequired { redirect }) if redirect == "/login?redirect=/cart"
        ));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let session = signed_in();
        let result: Result<(), _> = Authed::new(&session, "/profile")
            .run(|_| async { Err(ApiError::Unauthorized) })
            .await;

        assert!(matches!(
            result,
            Err(AuthedError::SessionExpired { redirect }) if redirect == "/login?redirect=/profile"
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_fallback_policy_keeps_session() {
        let session = signed_in();
        let result: Result<(), _> = Authed::new(&session, "/profile")
            .with_policy(UnauthorizedPolicy::ProfileFallback)
            .run(|_| async { Err(ApiError::Unauthorized) })
            .await;

        assert!(matches!(result, Err(AuthedError::Unauthorized)));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let session = signed_in();
        let result: Result<(), _> = Authed::new(&session, "/cart")
            .run(|_| async { Err(ApiError::NotFound { message: None }) })
            .await;

        assert!(matches!(result, Err(AuthedError::Api(ApiError::NotFound { .. }))));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_login_url_encodes_query() {
        assert_eq!(login_url("/"), "/login?redirect=/");
        assert_eq!(
            login_url("/products?search=red shirt"),
            "/login?redirect=/products%3Fsearch%3Dred+shirt"
        );
    }
}
