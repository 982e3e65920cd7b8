//! Pieces every page controller uses.

use std::sync::Arc;

use shopfront_core::{Price, ProductId};
use tracing::instrument;

use crate::api::{ApiClient, ApiError, Authed, AuthedError};
use crate::config::ClientConfig;
use crate::error::add_breadcrumb;
use crate::render::{AlertKind, AlertView, alert};
use crate::session::{SessionContext, SessionStore};

use super::nav::fetch_cart_count;

/// Shown before sending the user back to the login page.
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

// =============================================================================
// PageContext
// =============================================================================

/// Everything a controller needs for one page load.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub session: SessionContext,
    pub api: ApiClient,
    /// Whether the profile page may fall back to the user-info lookup.
    pub profile_fallback: bool,
}

impl PageContext {
    /// Build a context from configuration and a session backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Ok(Self {
            session: SessionContext::new(store),
            api: ApiClient::new(config)?,
            profile_fallback: config.profile_fallback,
        })
    }

    /// Authenticated calls made from the page at `return_to`.
    #[must_use]
    pub const fn authed<'a>(&'a self, return_to: &'a str) -> Authed<'a> {
        Authed::new(&self.session, return_to)
    }
}

// =============================================================================
// Effects
// =============================================================================

/// Something the host must do after a controller handled an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a transient alert.
    Alert(AlertView),
    /// Leave the page.
    Navigate(String),
    /// Update the cart badge in the navigation bar.
    CartCount(u32),
}

impl Effect {
    #[must_use]
    pub fn alert(kind: AlertKind, message: impl Into<String>) -> Self {
        Self::Alert(alert(kind, message))
    }

    #[must_use]
    pub fn navigate(to: impl Into<String>) -> Self {
        Self::Navigate(to.into())
    }

    /// The alert text, if this is an alert.
    #[must_use]
    pub fn alert_message(&self) -> Option<&str> {
        match self {
            Self::Alert(view) => Some(view.message.as_str()),
            Self::Navigate(_) | Self::CartCount(_) => None,
        }
    }

    /// The destination, if this is a navigation.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::Navigate(to) => Some(to.as_str()),
            Self::Alert(_) | Self::CartCount(_) => None,
        }
    }
}

/// Append `more` to `effects`, skipping ones already present.
pub(crate) fn push_unique(effects: &mut Vec<Effect>, more: Vec<Effect>) {
    for effect in more {
        if !effects.contains(&effect) {
            effects.push(effect);
        }
    }
}

/// Effects for the two outcomes that send the user to the login page.
///
/// Returns `None` for every other failure; the caller picks its own message.
#[must_use]
pub fn login_effects(error: &AuthedError) -> Option<Vec<Effect>> {
    match error {
        AuthedError::LoginRequired { redirect } => Some(vec![Effect::navigate(redirect)]),
        AuthedError::SessionExpired { redirect } => Some(vec![
            Effect::alert(AlertKind::Warning, SESSION_EXPIRED),
            Effect::navigate(redirect),
        ]),
        AuthedError::Unauthorized | AuthedError::Api(_) => None,
    }
}

// =============================================================================
// Panels
// =============================================================================

/// A page region that is filled by a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<T> {
    Loading,
    /// Fetched, nothing to show.
    Empty(&'static str),
    Loaded(T),
    Failed(String),
}

impl<T> Default for Panel<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> Panel<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Loading | Self::Empty(_) | Self::Failed(_) => None,
        }
    }

    /// Placeholder text for the empty and failed states.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Empty(message) => Some(*message),
            Self::Failed(message) => Some(message.as_str()),
            Self::Loading | Self::Loaded(_) => None,
        }
    }

    /// The placeholder as an alert fragment.
    #[must_use]
    pub fn placeholder(&self) -> Option<AlertView> {
        match self {
            Self::Empty(message) => Some(alert(AlertKind::Info, *message)),
            Self::Failed(message) => Some(alert(AlertKind::Danger, message.clone())),
            Self::Loading | Self::Loaded(_) => None,
        }
    }
}

// =============================================================================
// Redirects
// =============================================================================

/// Where to go after signing in.
///
/// Only same-site paths are honoured; anything else goes home.
///
/// ```
/// use shopfront_storefront::controllers::sanitize_redirect;
///
/// assert_eq!(sanitize_redirect(Some("/cart")), "/cart");
/// assert_eq!(sanitize_redirect(Some("https://evil.example")), "/");
/// assert_eq!(sanitize_redirect(None), "/");
/// ```
#[must_use]
pub fn sanitize_redirect(redirect: Option<&str>) -> String {
    match redirect.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_owned(),
        _ => "/".to_owned(),
    }
}

// =============================================================================
// Add to cart
// =============================================================================

const ADD_TO_CART_SUCCESS: &str = "Product added to cart!";
const ADD_TO_CART_RETRY: &str = "Failed to add product to cart. Please try again.";

/// Add one unit of a product to the cart from a product listing.
///
/// `price` is the price the card was rendered with.
#[instrument(skip_all, fields(product_id = %product_id, return_to))]
pub async fn add_to_cart(
    ctx: &PageContext,
    return_to: &str,
    product_id: &ProductId,
    price: Price,
) -> Vec<Effect> {
    let api = &ctx.api;
    let result = ctx
        .authed(return_to)
        .run(|token| async move { api.add_to_cart(&token, product_id, price).await })
        .await;

    match result {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Added product to cart",
                Some(&[("product_id", product_id.as_str())]),
            );
            vec![
                Effect::alert(AlertKind::Success, ADD_TO_CART_SUCCESS),
                Effect::CartCount(fetch_cart_count(ctx).await),
            ]
        }
        Err(e) => login_effects(&e).unwrap_or_else(|| {
            tracing::warn!(error = %e, "Failed to add product to cart");
            vec![Effect::alert(AlertKind::Danger, add_to_cart_failure(&e))]
        }),
    }
}

fn add_to_cart_failure(error: &AuthedError) -> String {
    match error {
        AuthedError::Api(e) if e.has_response() => format!(
            "Failed to add product to cart: {}",
            e.server_message().unwrap_or("Unknown error")
        ),
        _ => ADD_TO_CART_RETRY.to_owned(),
    }
}
