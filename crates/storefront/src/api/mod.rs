//! REST client for the storefront API.
//!
//! # Architecture
//!
//! - [`ApiClient::call`] is the single place a request is sent: it attaches
//!   the bearer token and a fresh `x-request-id`, and classifies failures
//!   into [`ApiError`]
//! - Typed endpoint methods live in one file per API area (`auth`,
//!   `products`, `cart`, `profile`, `orders`) and deserialize leniently
//! - [`authed::Authed`] applies the session-expiry policy around calls that
//!   need a token
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::api::ApiClient;
//!
//! let api = ApiClient::new(&config)?;
//! let page = api.list_products(&ProductQuery::page(1)).await?;
//! let count = api.cart_count(session.token().as_ref()).await?;
//! ```

mod auth;
pub mod authed;
mod cart;
mod error;
mod orders;
mod products;
mod profile;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Span, field, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::capture_request_error;

pub use auth::{AuthGrant, DEFAULT_ACCOUNT_TYPE, Registration};
pub use authed::{Authed, AuthedError, UnauthorizedPolicy};
pub use error::{ApiError, server_message};
pub use profile::ProfileUpdate;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Request / Response
// =============================================================================

/// A request to one API endpoint.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
    token: Option<SecretString>,
}

impl ApiRequest {
    /// A request for `path`, relative to the API base URL.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query parameters. Empty values are omitted.
    #[must_use]
    pub fn query(mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.query
            .extend(pairs.into_iter().filter(|(_, v)| !v.is_empty()));
        self
    }

    /// Set a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a bearer token, if there is one.
    #[must_use]
    pub fn bearer(mut self, token: Option<&SecretString>) -> Self {
        self.token = token.cloned();
        self
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// The JSON body, or `Null` for an empty body.
    pub data: Value,
}

impl ApiResponse {
    /// Deserialize the whole body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the body does not have the expected shape.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.data)?)
    }

    /// Deserialize the value under `key`, or the whole body when the key is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the value does not have the expected shape.
    pub fn decode_field<T: DeserializeOwned>(mut self, key: &str) -> Result<T, ApiError> {
        let value = match self.data.get_mut(key) {
            Some(inner) => inner.take(),
            None => self.data,
        };
        Ok(serde_json::from_value(value)?)
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an endpoint path and query against the base URL.
    fn url_for(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Send a request and classify the outcome.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for non-success statuses, transport failures, and
    /// success bodies that are not JSON.
    #[instrument(
        skip(self, request),
        fields(
            method = %request.method,
            path = %request.path,
            request_id = field::Empty,
            status = field::Empty
        )
    )]
    pub async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let url = self.url_for(&request.path, &request.query)?;
        let mut builder = self
            .inner
            .client
            .request(request.method, url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::Transport(e);
                capture_request_error(&err, &request_id);
                return Err(err);
            }
        };

        let status = response.status();
        Span::current().record("status", status.as_u16());

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let err = ApiError::Transport(e);
                capture_request_error(&err, &request_id);
                return Err(err);
            }
        };

        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(data) => data,
                // Error pages are often HTML; the status alone classifies them.
                Err(_) if !status.is_success() => Value::Null,
                Err(e) => {
                    tracing::error!(
                        body = %text.chars().take(500).collect::<String>(),
                        "Failed to parse API response"
                    );
                    let err = ApiError::Decode(e);
                    capture_request_error(&err, &request_id);
                    return Err(err);
                }
            }
        };

        if !status.is_success() {
            let err = ApiError::from_response(status, &data);
            tracing::debug!(error = %err, "API returned non-success status");
            return Err(err);
        }

        Ok(ApiResponse { status, data })
    }

    /// Send a request and deserialize the whole body.
    async fn call_decode<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.call(request).await?.decode()
    }
}

/// Build a `Decode` error for a success body missing a required field.
fn missing_field(field: &'static str) -> ApiError {
    ApiError::Decode(serde::de::Error::missing_field(field))
}
