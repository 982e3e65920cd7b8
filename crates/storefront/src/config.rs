//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFRONT_API_BASE_URL` - Base URL of the storefront REST API
//!
//! ## Optional
//! - `SHOPFRONT_SESSION_FILE` - Session file path (default: .shopfront/session.json)
//! - `SHOPFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: none)
//! - `SHOPFRONT_PROFILE_FALLBACK` - Look up the cached user by id when the
//!   profile refresh is rejected (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default location of the persisted session.
pub const DEFAULT_SESSION_FILE: &str = ".shopfront/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API (always ends with `/`)
    pub api_base_url: Url,
    /// Where the file-backed session store keeps its entries
    pub session_file: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Option<Duration>,
    /// Whether the profile page falls back to the user-info lookup on 401
    pub profile_fallback: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Configuration with defaults for everything except the API base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url: with_trailing_slash(api_base_url),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            request_timeout: None,
            profile_fallback: true,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("SHOPFRONT_API_BASE_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPFRONT_API_BASE_URL".to_string(), e))?;
        let session_file = PathBuf::from(get_env_or_default(
            "SHOPFRONT_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let request_timeout = get_optional_env("SHOPFRONT_REQUEST_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar(
                            "SHOPFRONT_REQUEST_TIMEOUT_SECS".to_string(),
                            e.to_string(),
                        )
                    })
            })
            .transpose()?;
        let profile_fallback = parse_bool(&get_env_or_default("SHOPFRONT_PROFILE_FALLBACK", "true"))
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "SHOPFRONT_PROFILE_FALLBACK".to_string(),
                    "expected true or false".to_string(),
                )
            })?;

        Ok(Self {
            api_base_url,
            session_file,
            request_timeout,
            profile_fallback,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse the API base URL, which must be http or https.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(with_trailing_slash(url))
}

/// Relative endpoint paths are joined onto the base, so the base must end in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
