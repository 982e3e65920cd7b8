//! Profile endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use shopfront_core::UserInfo;
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

/// Body of `PUT /api/profile`.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    /// Only sent when the user asked to change it.
    pub password: Option<SecretString>,
}

impl ProfileUpdate {
    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("first_name".into(), Value::from(self.first_name.as_str()));
        body.insert("last_name".into(), Value::from(self.last_name.as_str()));
        if let Some(password) = &self.password {
            body.insert("password".into(), Value::from(password.expose_secret()));
        }
        Value::Object(body)
    }
}

impl ApiClient {
    /// `GET /api/profile`. The user may be wrapped in `user` or sent bare.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all)]
    pub async fn profile(&self, token: &SecretString) -> Result<UserInfo, ApiError> {
        self.call(ApiRequest::get("/api/profile").bearer(Some(token)))
            .await?
            .decode_field("user")
    }

    /// `PUT /api/profile`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all, fields(password_change = update.password.is_some()))]
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<(), ApiError> {
        self.call(
            ApiRequest::put("/api/profile")
                .bearer(Some(token))
                .json(update.to_body()),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_body_omits_password_when_unchanged() {
        let update = ProfileUpdate {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: None,
        };
        assert_eq!(
            update.to_body(),
            json!({"first_name": "Ada", "last_name": "Lovelace"})
        );
    }

    #[test]
    fn test_body_includes_new_password() {
        let update = ProfileUpdate {
            first_name: "Madonna".to_string(),
            last_name: String::new(),
            password: Some(SecretString::from("hunter22")),
        };
        assert_eq!(
            update.to_body(),
            json!({"first_name": "Madonna", "last_name": "", "password": "hunter22"})
        );
    }
}
