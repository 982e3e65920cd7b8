//! Page controllers.
//!
//! One controller per page. A controller is created for a page load, is
//! handed the [`PageContext`] on every event, keeps the page's view state,
//! and returns the [`Effect`]s the host must carry out (alerts, navigation,
//! cart badge updates). Errors never escape a controller; they end up as
//! view state or effects.
//!
//! # Pages
//!
//! - [`home`] - featured products
//! - [`auth`] - login, registration, password reset
//! - [`catalog`] - product search and pagination
//! - [`cart`] - cart lines and checkout
//! - [`profile`] - account details and order history
//! - [`nav`] - navigation bar shared by every page

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod home;
pub mod nav;
pub mod profile;
mod shared;

pub use auth::{
    AuthPage, ForgotPasswordModal, FormState, LoginForm, RegisterForm, ResetPasswordForm,
};
pub use cart::{CartPage, PaymentDetails, ShippingDetails};
pub use catalog::{CatalogInputs, CatalogPage};
pub use home::HomePage;
pub use nav::{Navigation, fetch_cart_count};
pub use profile::{EditProfileModal, ProfileEdit, ProfilePage};
pub use shared::{
    Effect, PageContext, Panel, SESSION_EXPIRED, add_to_cart, login_effects, sanitize_redirect,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use std::sync::Arc;

    use url::Url;

    use super::PageContext;
    use crate::config::ClientConfig;
    use crate::session::MemorySessionStore;

    /// A context whose API is unreachable; any request fails with a
    /// transport error.
    pub fn offline_context(store: MemorySessionStore) -> PageContext {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        PageContext::new(&config, Arc::new(store)).unwrap()
    }
}
