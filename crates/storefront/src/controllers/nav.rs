//! Navigation bar shared by every page.

use tracing::instrument;

use crate::api::ApiError;
use crate::error::add_breadcrumb;
use crate::render::{NavView, nav};

use super::shared::{Effect, PageContext};

/// Current cart item count for the badge.
///
/// Errors show as 0. A 401 also clears the session, without any alert.
#[instrument(skip_all)]
pub async fn fetch_cart_count(ctx: &PageContext) -> u32 {
    let token = ctx.session.token();
    match ctx.api.cart_count(token.as_ref()).await {
        Ok(count) => count,
        Err(ApiError::Unauthorized) => {
            tracing::debug!("Cart count rejected the session token");
            ctx.session.clear();
            0
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart count");
            0
        }
    }
}

/// Auth-dependent navigation items and the cart badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigation {
    logged_in: bool,
    cart_count: u32,
}

impl Navigation {
    /// Navigation for a page load. The cart count is only fetched for a
    /// signed-in user.
    pub async fn load(ctx: &PageContext) -> Self {
        let mut navigation = Self {
            logged_in: ctx.session.is_authenticated(),
            cart_count: 0,
        };
        if navigation.logged_in {
            navigation.refresh_cart_count(ctx).await;
        }
        navigation
    }

    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.logged_in
    }

    #[must_use]
    pub const fn cart_count(&self) -> u32 {
        self.cart_count
    }

    pub async fn refresh_cart_count(&mut self, ctx: &PageContext) {
        self.cart_count = fetch_cart_count(ctx).await;
        self.logged_in = ctx.session.is_authenticated();
    }

    /// Apply the badge updates among a controller's effects.
    pub fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            if let Effect::CartCount(count) = effect {
                self.cart_count = *count;
            }
        }
    }

    /// Sign out and go home.
    #[instrument(skip_all)]
    pub fn logout(&mut self, ctx: &PageContext) -> Vec<Effect> {
        ctx.session.clear();
        add_breadcrumb("auth", "Logged out", None);
        tracing::info!("User logged out");
        *self = Self::default();
        vec![Effect::navigate("/")]
    }

    #[must_use]
    pub const fn view(&self) -> NavView {
        nav(self.logged_in, self.cart_count)
    }
}
