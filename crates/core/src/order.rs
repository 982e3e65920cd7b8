//! Orders and order items.

use serde::{Deserialize, Serialize};

use crate::text::{format_date, format_datetime};
use crate::types::lenient::{count_or_zero, list_or_empty, non_blank};
use crate::types::{OrderId, OrderStatus, Price};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: Price,
    #[serde(default, deserialize_with = "non_blank")]
    pub shipping_address: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Order date for the history table, or "N/A".
    #[must_use]
    pub fn date_label(&self) -> String {
        self.created_at
            .as_deref()
            .and_then(format_date)
            .unwrap_or_else(|| "N/A".to_owned())
    }

    /// Order date and time for the detail modal, or "N/A".
    #[must_use]
    pub fn datetime_label(&self) -> String {
        self.created_at
            .as_deref()
            .and_then(format_datetime)
            .unwrap_or_else(|| "N/A".to_owned())
    }

    #[must_use]
    pub fn address_label(&self) -> &str {
        self.shipping_address
            .as_deref()
            .unwrap_or("No address provided")
    }
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default = "unknown_product", deserialize_with = "name_or_unknown")]
    pub product_name: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub quantity: u32,
}

fn unknown_product() -> String {
    "Unknown product".to_owned()
}

fn name_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    non_blank(deserializer).map(|name| name.unwrap_or_else(unknown_product))
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_order_detail_shape() {
        let order: Order = serde_json::from_value(json!({
            "id": 42,
            "status": "Shipped",
            "total_amount": "35.00",
            "shipping_address": "Ada Lovelace, 1 Main St, London, N1, UK",
            "created_at": "2024-03-01T12:30:00",
            "items": [
                {"product_name": "Mug", "price": 8.5, "quantity": 2},
                {"price": 18, "quantity": "1"}
            ]
        }))
        .unwrap();

        assert_eq!(order.id.as_str(), "42");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_amount.to_string(), "$35.00");
        assert_eq!(order.date_label(), "3/1/2024");
        assert_eq!(order.datetime_label(), "3/1/2024, 12:30:00 PM");

        let first = order.items.first().unwrap();
        assert_eq!(first.subtotal(), Price::from_cents(1700));
        let second = order.items.get(1).unwrap();
        assert_eq!(second.product_name, "Unknown product");
        assert_eq!(second.subtotal(), Price::from_cents(1800));
    }

    #[test]
    fn test_missing_and_malformed_items() {
        let order: Order = serde_json::from_value(json!({"_id": "a1"})).unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.address_label(), "No address provided");
        assert_eq!(order.date_label(), "N/A");

        let order: Order =
            serde_json::from_value(json!({"id": "a2", "items": "not a list"})).unwrap();
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_unrecognised_status_is_kept() {
        let order: Order =
            serde_json::from_value(json!({"id": 1, "status": "refunded"})).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown("refunded".to_string()));
        assert_eq!(order.status.badge_class(), "bg-secondary");
    }
}
