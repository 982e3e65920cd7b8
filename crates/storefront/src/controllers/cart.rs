//! Cart page and checkout.
//!
//! Handlers take `&self` so several clicks can be in flight at once:
//! quantity changes and removals queue behind one another in click order,
//! and cart reloads are latest-wins, so a slow stale reload never overwrites
//! a newer one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::{Cart, CartItemId, CartLine};
use tracing::instrument;

use crate::api::{ApiError, AuthedError};
use crate::error::{ValidationError, add_breadcrumb};
use crate::render::{AlertKind, CartRow, CartSummary, cart_row, cart_summary};
use crate::sequencer::LatestWins;

use super::nav::fetch_cart_count;
use super::shared::{Effect, PageContext, Panel, login_effects};

const PATH: &str = "/cart";
const CART_EMPTY: &str = "Your cart is empty.";
const CART_FAILED: &str = "Error loading cart data. Please try again later.";
const QUANTITY_FAILED: &str = "Failed to update cart item quantity. Please try again.";
const REMOVE_FAILED: &str = "Failed to remove cart item. Please try again.";
const ORDER_PLACED: &str = "Order placed successfully!";
const ORDER_FAILED: &str = "Failed to place order. Please try again.";

// =============================================================================
// Checkout forms
// =============================================================================

/// Shipping fields of the checkout modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingDetails {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

impl ShippingDetails {
    fn fields(&self) -> [&str; 5] {
        [
            self.full_name.trim(),
            self.address.trim(),
            self.city.trim(),
            self.zip.trim(),
            self.country.trim(),
        ]
    }

    /// The single-line address sent with the order.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingShipping` if any field is blank.
    pub fn shipping_address(&self) -> Result<String, ValidationError> {
        let fields = self.fields();
        if fields.iter().any(|f| f.is_empty()) {
            return Err(ValidationError::MissingShipping);
        }
        Ok(fields.join(", "))
    }
}

/// Payment fields of the checkout modal.
///
/// Checked for presence only. None of these leave the client.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub card_name: String,
    pub card_number: SecretString,
    pub expiry: SecretString,
    pub cvv: SecretString,
}

impl PaymentDetails {
    /// # Errors
    ///
    /// Returns `ValidationError::MissingPayment` if any field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secrets = [&self.card_number, &self.expiry, &self.cvv];
        if self.card_name.trim().is_empty()
            || secrets.iter().any(|s| s.expose_secret().trim().is_empty())
        {
            return Err(ValidationError::MissingPayment);
        }
        Ok(())
    }
}

// =============================================================================
// CartPage
// =============================================================================

#[derive(Debug, Default)]
struct CartState {
    cart: Panel<Cart>,
    checkout_open: bool,
}

#[derive(Debug, Default)]
pub struct CartPage {
    state: Mutex<CartState>,
    // Held for the whole of a mutation and its reload.
    mutations: tokio::sync::Mutex<()>,
    reloads: LatestWins,
}

impl CartPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_cart(&self, cart: Panel<Cart>) {
        let mut state = self.state();
        if cart.loaded().is_none() {
            state.checkout_open = false;
        }
        state.cart = cart;
    }

    fn line_quantity(
        &self,
        id: &CartItemId,
        step: impl FnOnce(&CartLine) -> Option<u32>,
    ) -> Option<u32> {
        self.state()
            .cart
            .loaded()
            .and_then(|cart| cart.line(id))
            .and_then(step)
    }

    /// Snapshot of the cart panel.
    #[must_use]
    pub fn panel(&self) -> Panel<Cart> {
        self.state().cart.clone()
    }

    #[must_use]
    pub fn rows(&self) -> Vec<CartRow> {
        self.state()
            .cart
            .loaded()
            .map(|cart| cart.lines.iter().map(cart_row).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn summary(&self) -> Option<CartSummary> {
        self.state().cart.loaded().map(cart_summary)
    }

    /// Displayed quantity of one line.
    #[must_use]
    pub fn quantity_of(&self, id: &CartItemId) -> Option<u32> {
        self.line_quantity(id, |line| Some(line.quantity))
    }

    #[must_use]
    pub fn checkout_open(&self) -> bool {
        self.state().checkout_open
    }

    /// Page load. Without a session the user is sent to log in.
    #[instrument(skip_all)]
    pub async fn load(&self, ctx: &PageContext) -> Vec<Effect> {
        self.set_cart(Panel::Loading);
        self.reload(ctx).await
    }

    async fn reload(&self, ctx: &PageContext) -> Vec<Effect> {
        let api = ctx.api.clone();
        let result = ctx
            .authed(PATH)
            .run(|token| self.reloads.run(async move { api.cart(&token).await }))
            .await;

        match result {
            Ok(cart) if cart.is_empty() => {
                self.set_cart(Panel::Empty(CART_EMPTY));
                Vec::new()
            }
            Ok(cart) => {
                self.set_cart(Panel::Loaded(cart));
                Vec::new()
            }
            Err(AuthedError::Api(ApiError::Cancelled)) => {
                tracing::debug!("Cart reload superseded");
                Vec::new()
            }
            Err(e) => login_effects(&e).unwrap_or_else(|| {
                tracing::warn!(error = %e, "Failed to load cart");
                self.set_cart(Panel::Failed(CART_FAILED.to_owned()));
                Vec::new()
            }),
        }
    }

    #[instrument(skip_all, fields(item_id = %id))]
    pub async fn increment(&self, ctx: &PageContext, id: &CartItemId) -> Vec<Effect> {
        let _queued = self.mutations.lock().await;
        let Some(quantity) = self.line_quantity(id, |line| Some(line.incremented())) else {
            tracing::debug!("No such cart line");
            return Vec::new();
        };
        self.set_quantity(ctx, id, quantity).await
    }

    /// Quantity minus one. A line at quantity 1 is left alone and no request
    /// is sent; removing it takes the remove button.
    #[instrument(skip_all, fields(item_id = %id))]
    pub async fn decrement(&self, ctx: &PageContext, id: &CartItemId) -> Vec<Effect> {
        let _queued = self.mutations.lock().await;
        let Some(quantity) = self.line_quantity(id, CartLine::decremented) else {
            return Vec::new();
        };
        self.set_quantity(ctx, id, quantity).await
    }

    async fn set_quantity(
        &self,
        ctx: &PageContext,
        id: &CartItemId,
        quantity: u32,
    ) -> Vec<Effect> {
        let api = &ctx.api;
        let result = ctx
            .authed(PATH)
            .run(|token| async move { api.update_cart_item(&token, id, quantity).await })
            .await;
        self.after_mutation(ctx, result, QUANTITY_FAILED).await
    }

    #[instrument(skip_all, fields(item_id = %id))]
    pub async fn remove(&self, ctx: &PageContext, id: &CartItemId) -> Vec<Effect> {
        let _queued = self.mutations.lock().await;
        let api = &ctx.api;
        let result = ctx
            .authed(PATH)
            .run(|token| async move { api.remove_cart_item(&token, id).await })
            .await;
        if result.is_ok() {
            add_breadcrumb("cart", "Removed cart item", Some(&[("item_id", id.as_str())]));
        }
        self.after_mutation(ctx, result, REMOVE_FAILED).await
    }

    /// Reload the cart and the badge after a successful change.
    async fn after_mutation(
        &self,
        ctx: &PageContext,
        result: Result<(), AuthedError>,
        failure: &str,
    ) -> Vec<Effect> {
        match result {
            Ok(()) => {
                let mut effects = self.reload(ctx).await;
                effects.push(Effect::CartCount(fetch_cart_count(ctx).await));
                effects
            }
            Err(e) => login_effects(&e).unwrap_or_else(|| {
                tracing::warn!(error = %e, "Cart update failed");
                vec![Effect::alert(AlertKind::Danger, failure)]
            }),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Open the checkout modal. Only a populated cart can be checked out.
    pub fn open_checkout(&self) -> bool {
        let mut state = self.state();
        state.checkout_open = state.cart.loaded().is_some();
        state.checkout_open
    }

    pub fn close_checkout(&self) {
        self.state().checkout_open = false;
    }

    /// Place an order for the current cart.
    #[instrument(skip_all)]
    pub async fn checkout(
        &self,
        ctx: &PageContext,
        shipping: &ShippingDetails,
        payment: &PaymentDetails,
    ) -> Vec<Effect> {
        let address = match shipping
            .shipping_address()
            .and_then(|address| payment.validate().map(|()| address))
        {
            Ok(address) => address,
            Err(e) => return vec![Effect::alert(AlertKind::Danger, e.to_string())],
        };

        let _queued = self.mutations.lock().await;
        let api = &ctx.api;
        let address = address.as_str();
        let result = ctx
            .authed(PATH)
            .run(|token| async move { api.place_order(&token, address).await })
            .await;

        match result {
            Ok(()) => {
                add_breadcrumb("checkout", "Order placed", None);
                tracing::info!("Order placed");
                self.close_checkout();
                vec![
                    Effect::alert(AlertKind::Success, ORDER_PLACED),
                    Effect::navigate("/"),
                ]
            }
            Err(e) => login_effects(&e).unwrap_or_else(|| {
                tracing::warn!(error = %e, "Failed to place order");
                let message = match &e {
                    AuthedError::Api(api_error) => api_error.server_message(),
                    _ => None,
                };
                vec![Effect::alert(
                    AlertKind::Danger,
                    message.unwrap_or(ORDER_FAILED),
                )]
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use shopfront_core::UserInfo;

    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::session::MemorySessionStore;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Ada Lovelace".to_string(),
            address: "12 St James's Square".to_string(),
            city: "London".to_string(),
            zip: "SW1Y 4JH".to_string(),
            country: "UK".to_string(),
        }
    }

    fn payment(cvv: &str) -> PaymentDetails {
        PaymentDetails {
            card_name: "A Lovelace".to_string(),
            card_number: SecretString::from("4242424242424242"),
            expiry: SecretString::from("12/30"),
            cvv: SecretString::from(cvv),
        }
    }

    fn page_with_line(quantity: u32) -> CartPage {
        let cart: Cart = serde_json::from_value(json!({
            "items": [{"id": "line-1", "product_name": "Mug", "price": 4, "quantity": quantity}]
        }))
        .unwrap();
        let page = CartPage::new();
        page.set_cart(Panel::Loaded(cart));
        page
    }

    #[test]
    fn test_shipping_address_joins_fields() {
        assert_eq!(
            shipping().shipping_address().unwrap(),
            "Ada Lovelace, 12 St James's Square, London, SW1Y 4JH, UK"
        );

        let mut missing = shipping();
        missing.city = " ".to_string();
        assert_eq!(
            missing.shipping_address().unwrap_err(),
            ValidationError::MissingShipping
        );
    }

    #[test]
    fn test_payment_requires_every_field() {
        assert!(payment("123").validate().is_ok());
        assert_eq!(
            payment("").validate().unwrap_err(),
            ValidationError::MissingPayment
        );
    }

    #[test]
    fn test_payment_debug_is_redacted() {
        let debug = format!("{:?}", payment("999"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("999"));
    }

    #[tokio::test]
    async fn test_decrement_at_one_sends_nothing() {
        // The API is unreachable, so any request would surface as an alert.
        let ctx = offline_context(MemorySessionStore::signed_in("tok", UserInfo::default()));
        let page = page_with_line(1);
        let id = CartItemId::new("line-1");

        let effects = page.decrement(&ctx, &id).await;

        assert!(effects.is_empty());
        assert_eq!(page.quantity_of(&id), Some(1));
    }

    #[tokio::test]
    async fn test_failed_update_alerts_and_keeps_quantity() {
        let ctx = offline_context(MemorySessionStore::signed_in("tok", UserInfo::default()));
        let page = page_with_line(2);
        let id = CartItemId::new("line-1");

        let effects = page.increment(&ctx, &id).await;

        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].alert_message(), Some(QUANTITY_FAILED));
        assert_eq!(page.quantity_of(&id), Some(2));
    }

    #[tokio::test]
    async fn test_load_without_session_goes_to_login() {
        let ctx = offline_context(MemorySessionStore::default());
        let effects = CartPage::new().load(&ctx).await;
        assert_eq!(effects, vec![Effect::navigate("/login?redirect=/cart")]);
    }

    #[tokio::test]
    async fn test_checkout_validates_before_sending() {
        let ctx = offline_context(MemorySessionStore::signed_in("tok", UserInfo::default()));
        let page = page_with_line(1);

        let mut incomplete = shipping();
        incomplete.zip.clear();
        let effects = page.checkout(&ctx, &incomplete, &payment("123")).await;
        assert_eq!(
            effects[0].alert_message(),
            Some("Please fill in all shipping information fields.")
        );

        let effects = page.checkout(&ctx, &shipping(), &payment(" ")).await;
        assert_eq!(
            effects[0].alert_message(),
            Some("Please fill in all payment information fields.")
        );
    }

    #[test]
    fn test_checkout_needs_populated_cart() {
        let empty = CartPage::new();
        assert!(!empty.open_checkout());

        let page = page_with_line(1);
        assert!(page.open_checkout());
        page.set_cart(Panel::Empty(CART_EMPTY));
        assert!(!page.checkout_open());
    }
}
