//! Authentication endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use shopfront_core::{Email, UserId, UserInfo};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest, missing_field};

/// Default account type for new registrations.
pub const DEFAULT_ACCOUNT_TYPE: &str = "customer";

/// Token and user record returned by login and registration.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: SecretString,
    pub user: UserInfo,
}

impl AuthGrant {
    /// Extract a grant from a login or registration response.
    ///
    /// The token is read from `access_token`, falling back to `token`. The user
    /// is read from `user` when present. A role is always filled in: the
    /// top-level `role`, the user's own role, or "customer".
    fn from_body(data: &Value) -> Result<Self, ApiError> {
        let token = ["access_token", "token"]
            .iter()
            .filter_map(|key| data.get(key).and_then(Value::as_str))
            .find(|t| !t.trim().is_empty())
            .ok_or_else(|| missing_field("token"))?;

        let mut user = data
            .get("user")
            .and_then(|u| serde_json::from_value::<UserInfo>(u.clone()).ok())
            .unwrap_or_default();
        if let Some(role) = data.get("role").and_then(Value::as_str) {
            user.role = Some(role.to_owned());
        } else if user.role.is_none() {
            user.role = Some(DEFAULT_ACCOUNT_TYPE.to_owned());
        }

        Ok(Self {
            token: SecretString::from(token),
            user,
        })
    }
}

/// A new account.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub account_type: String,
}

impl ApiClient {
    /// `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the response has no token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthGrant, ApiError> {
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let response = self
            .call(ApiRequest::post("/api/auth/login").json(body))
            .await?;
        AuthGrant::from_body(&response.data)
    }

    /// `POST /api/auth/register`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the response has no token.
    #[instrument(skip_all, fields(email = %registration.email, account_type = %registration.account_type))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        let body = json!({
            "name": registration.name,
            "email": registration.email,
            "password": registration.password.expose_secret(),
            "account_type": registration.account_type,
        });
        let response = self
            .call(ApiRequest::post("/api/auth/register").json(body))
            .await?;
        AuthGrant::from_body(&response.data)
    }

    /// `POST /api/auth/forgot-password`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &Email) -> Result<(), ApiError> {
        self.call(
            ApiRequest::post("/api/auth/forgot-password").json(json!({ "email": email })),
        )
        .await?;
        Ok(())
    }

    /// `POST /api/auth/reset-password`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        reset_token: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), ApiError> {
        let body = json!({
            "token": reset_token.expose_secret(),
            "new_password": new_password.expose_secret(),
        });
        self.call(ApiRequest::post("/api/auth/reset-password").json(body))
            .await?;
        Ok(())
    }

    /// `GET /api/auth/user-info?id=`, sent without a token.
    ///
    /// Returns `None` unless the server answers `{ success: true, user }`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn user_info(&self, id: &UserId) -> Result<Option<UserInfo>, ApiError> {
        let response = self
            .call(ApiRequest::get("/api/auth/user-info").query([("id", id.to_string())]))
            .await?;

        let success = response
            .data
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            return Ok(None);
        }

        Ok(response
            .data
            .get("user")
            .and_then(|u| serde_json::from_value(u.clone()).ok()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_prefers_access_token() {
        let grant = AuthGrant::from_body(&json!({
            "access_token": "jwt-1",
            "token": "legacy",
            "user": {"id": 3, "role": "admin"}
        }))
        .unwrap();
        assert_eq!(grant.token.expose_secret(), "jwt-1");
        assert_eq!(grant.user.id, Some(UserId::new("3")));
        assert_eq!(grant.user.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_grant_defaults_role() {
        let grant = AuthGrant::from_body(&json!({"token": "t"})).unwrap();
        assert_eq!(grant.user.role.as_deref(), Some("customer"));
        assert!(grant.user.id.is_none());

        let grant = AuthGrant::from_body(&json!({"token": "t", "role": "seller"})).unwrap();
        assert_eq!(grant.user.role.as_deref(), Some("seller"));
    }

    #[test]
    fn test_grant_requires_token() {
        let err = AuthGrant::from_body(&json!({"access_token": "", "user": {}})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
