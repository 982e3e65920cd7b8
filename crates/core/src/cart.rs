//! Cart lines and cart totals.
//!
//! The cart is always rebuilt from the latest server response. Totals are
//! derived on every read and never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::lenient::{list_or_empty, non_blank, quantity_at_least_one};
use crate::types::{CartItemId, Price, ProductId};

/// Flat shipping fee, charged only when the subtotal is positive.
pub const SHIPPING_FEE: Price = Price::new(Decimal::from_parts(1000, 0, 0, false, 2));

/// One product/quantity pairing in the user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(alias = "_id")]
    pub id: CartItemId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "non_blank")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default = "one", deserialize_with = "quantity_at_least_one")]
    pub quantity: u32,
    #[serde(
        default,
        alias = "image",
        alias = "product_image",
        deserialize_with = "non_blank"
    )]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub variant_info: Option<String>,
    #[serde(default = "available")]
    pub product_available: bool,
}

const fn one() -> u32 {
    1
}

const fn available() -> bool {
    true
}

impl CartLine {
    /// `price * quantity`.
    #[must_use]
    pub fn line_subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Quantity after pressing "+".
    #[must_use]
    pub const fn incremented(&self) -> u32 {
        self.quantity.saturating_add(1)
    }

    /// Quantity after pressing "-", or `None` if that would drop below one.
    #[must_use]
    pub const fn decremented(&self) -> Option<u32> {
        if self.quantity > 1 {
            Some(self.quantity - 1)
        } else {
            None
        }
    }

    /// Product name as sent by the server, or a placeholder.
    #[must_use]
    pub fn name(&self) -> &str {
        self.product_name.as_deref().unwrap_or("Unknown product")
    }
}

/// The user's cart: an ordered list of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(
        rename = "items",
        alias = "cart_items",
        default,
        deserialize_with = "list_or_empty"
    )]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Sum of all line subtotals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_subtotal).sum()
    }

    /// Shipping fee: [`SHIPPING_FEE`] if the subtotal is positive, else zero.
    #[must_use]
    pub fn shipping_fee(&self) -> Price {
        if self.subtotal().is_positive() {
            SHIPPING_FEE
        } else {
            Price::ZERO
        }
    }

    /// Subtotal plus shipping.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal() + self.shipping_fee()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by id.
    #[must_use]
    pub fn line(&self, id: &CartItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line(id: &str, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product_id: Some(ProductId::new(format!("p-{id}"))),
            product_name: Some(format!("Item {id}")),
            price: Price::from_cents(cents),
            quantity,
            image_url: None,
            variant_info: None,
            product_available: true,
        }
    }

    #[test]
    fn test_totals() {
        let cart = Cart {
            lines: vec![line("a", 1999, 2), line("b", 500, 1)],
        };
        assert_eq!(cart.subtotal(), Price::from_cents(4498));
        assert_eq!(cart.shipping_fee(), SHIPPING_FEE);
        assert_eq!(cart.total(), Price::from_cents(5498));
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let cart = Cart::default();
        assert_eq!(cart.subtotal(), Price::ZERO);
        assert_eq!(cart.shipping_fee(), Price::ZERO);
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_free_items_have_no_shipping() {
        let cart = Cart {
            lines: vec![line("gift", 0, 3)],
        };
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_oversized_line_totals_saturate() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [{"_id": "big", "price": "50000000000000000000000000000", "quantity": 2}]
        }))
        .unwrap();
        let max = Price::new(Decimal::MAX);
        assert_eq!(cart.lines.first().unwrap().line_subtotal(), max);
        assert_eq!(cart.total(), max);
    }

    #[test]
    fn test_decrement_stops_at_one() {
        assert_eq!(line("a", 100, 3).decremented(), Some(2));
        assert_eq!(line("a", 100, 1).decremented(), None);
        assert_eq!(line("a", 100, 1).incremented(), 2);
    }

    #[test]
    fn test_deserialize_server_shape() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [{
                "_id": "665f00000000000000000001",
                "product_id": "665f0000000000000000aaaa",
                "product_name": "Red T-Shirt",
                "price": 12.5,
                "quantity": 2,
                "product_available": true
            }]
        }))
        .unwrap();
        let first = cart.lines.first().unwrap();
        assert_eq!(first.id.as_str(), "665f00000000000000000001");
        assert_eq!(first.line_subtotal(), Price::from_cents(2500));
        assert_eq!(first.name(), "Red T-Shirt");
    }

    #[test]
    fn test_deserialize_legacy_field_and_bad_values() {
        let cart: Cart = serde_json::from_value(json!({
            "cart_items": [{"id": 9, "price": null, "quantity": "0"}, {"price": 3}]
        }))
        .unwrap();
        // The line without an id is dropped.
        assert_eq!(cart.lines.len(), 1);
        let first = cart.lines.first().unwrap();
        assert_eq!(first.id.as_str(), "9");
        assert_eq!(first.price, Price::ZERO);
        assert_eq!(first.quantity, 1);
        assert_eq!(first.name(), "Unknown product");
    }
}
