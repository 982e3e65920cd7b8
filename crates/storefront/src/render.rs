//! View models and askama templates for every page fragment.
//!
//! Each helper turns a domain value into a struct whose fields are already
//! display strings; the struct's `render()` produces the HTML.
//! All text goes through askama's HTML escaping.

use askama::Template;
use shopfront_core::text::dedupe_repeated_name;
use shopfront_core::{Cart, CartLine, Order, OrderItem, PageLink, Pagination, Product, UserInfo};

/// Thumbnail shown for cart lines without an image.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.png";

/// Alert styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
    Warning,
    Info,
}

impl AlertKind {
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Success => "alert-success",
            Self::Danger => "alert-danger",
            Self::Warning => "alert-warning",
            Self::Info => "alert-info",
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// Product card with an "Add to Cart" trigger.
///
/// The trigger carries the product id and the price as rendered, so adding to
/// the cart sends the price the user saw.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/product_card.html")]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub price_value: String,
    pub stock: u32,
}

#[must_use]
pub fn product_card(product: &Product) -> ProductCard {
    ProductCard {
        id: product.id.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price.display(),
        price_value: product.price.amount().normalize().to_string(),
        stock: product.stock,
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One row of the cart table.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/cart_row.html")]
pub struct CartRow {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub variant_info: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub line_subtotal: String,
    pub available: bool,
    pub can_decrement: bool,
}

/// Cart row for one line. Repeated product names are collapsed for display
/// only.
#[must_use]
pub fn cart_row(line: &CartLine) -> CartRow {
    CartRow {
        id: line.id.to_string(),
        name: dedupe_repeated_name(line.name()),
        image_url: line
            .image_url
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        variant_info: line.variant_info.clone(),
        unit_price: line.price.display(),
        quantity: line.quantity,
        line_subtotal: line.line_subtotal().display(),
        available: line.product_available,
        can_decrement: line.decremented().is_some(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/cart_summary.html")]
pub struct CartSummary {
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

#[must_use]
pub fn cart_summary(cart: &Cart) -> CartSummary {
    CartSummary {
        subtotal: cart.subtotal().display(),
        shipping: cart.shipping_fee().display(),
        total: cart.total().display(),
    }
}

/// Cart count in the navigation bar; hidden when zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Template)]
#[template(path = "partials/cart_count_badge.html")]
pub struct CartCountBadge {
    pub count: u32,
    pub hidden: bool,
}

#[must_use]
pub const fn cart_count_badge(count: u32) -> CartCountBadge {
    CartCountBadge {
        count,
        hidden: count == 0,
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One row of the order history table.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/order_row.html")]
pub struct OrderRow {
    pub id: String,
    pub date: String,
    pub amount: String,
    pub status_label: String,
    pub badge_class: &'static str,
}

#[must_use]
pub fn order_row(order: &Order) -> OrderRow {
    OrderRow {
        id: order.id.to_string(),
        date: order.date_label(),
        amount: order.total_amount.display(),
        status_label: order.status.label().to_string(),
        badge_class: order.status.badge_class(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRow {
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub subtotal: String,
}

#[must_use]
pub fn order_item_row(item: &OrderItem) -> OrderItemRow {
    OrderItemRow {
        name: item.product_name.clone(),
        unit_price: item.price.display(),
        quantity: item.quantity,
        subtotal: item.subtotal().display(),
    }
}

/// Item rows of an order; a single "no items" row when empty.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/order_item_rows.html")]
pub struct OrderItemRows {
    pub rows: Vec<OrderItemRow>,
}

#[must_use]
pub fn order_item_rows(items: &[OrderItem]) -> OrderItemRows {
    OrderItemRows {
        rows: items.iter().map(order_item_row).collect(),
    }
}

/// Contents of the order detail modal.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/order_detail.html")]
pub struct OrderDetail {
    pub id: String,
    pub date: String,
    pub status_label: String,
    pub badge_class: &'static str,
    pub total: String,
    pub address: String,
    pub rows: Vec<OrderItemRow>,
}

#[must_use]
pub fn order_detail(order: &Order) -> OrderDetail {
    OrderDetail {
        id: order.id.to_string(),
        date: order.datetime_label(),
        status_label: order.status.label().to_string(),
        badge_class: order.status.badge_class(),
        total: order.total_amount.display(),
        address: order.address_label().to_string(),
        rows: order_item_rows(&order.items).rows,
    }
}

// =============================================================================
// Shared widgets
// =============================================================================

/// Pagination control; renders nothing for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/pagination.html")]
pub struct PaginationView {
    pub visible: bool,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub links: Vec<PageLink>,
}

#[must_use]
pub fn pagination(position: Pagination) -> PaginationView {
    PaginationView {
        visible: position.is_visible(),
        previous: position.previous(),
        next: position.next(),
        links: position.links(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/alert.html")]
pub struct AlertView {
    pub class: &'static str,
    pub message: String,
}

#[must_use]
pub fn alert(kind: AlertKind, message: impl Into<String>) -> AlertView {
    AlertView {
        class: kind.class(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "partials/profile_card.html")]
pub struct ProfileCard {
    pub name: String,
    pub email: String,
    pub account_type: String,
    pub joined: String,
}

#[must_use]
pub fn profile_card(user: &UserInfo) -> ProfileCard {
    ProfileCard {
        name: user.display_name(),
        email: user.email.clone().unwrap_or_default(),
        account_type: user.account_type_label(),
        joined: user.joined_label(),
    }
}

/// Navigation bar items for the current auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Template)]
#[template(path = "partials/nav.html")]
pub struct NavView {
    pub logged_in: bool,
    pub cart_count: u32,
    pub badge_hidden: bool,
}

#[must_use]
pub const fn nav(logged_in: bool, cart_count: u32) -> NavView {
    NavView {
        logged_in,
        cart_count,
        badge_hidden: cart_count == 0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use shopfront_core::{CartItemId, OrderId, OrderStatus, Price, ProductId};

    use super::*;

    fn line(name: &str, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::new("line-1"),
            product_id: Some(ProductId::new("p-1")),
            product_name: Some(name.to_string()),
            price: Price::from_cents(cents),
            quantity,
            image_url: None,
            variant_info: Some("Size: M".to_string()),
            product_available: true,
        }
    }

    #[test]
    fn test_product_card() {
        let product: Product = serde_json::from_value(json!({
            "id": "abc", "name": "Mug <XL>", "description": "Big", "price": 8.5, "stock": 3
        }))
        .unwrap();
        let card = product_card(&product);
        assert_eq!(card.price, "$8.50");
        assert_eq!(card.price_value, "8.5");

        let html = card.render().unwrap();
        assert!(html.contains("Mug &#60;XL&#62;") || html.contains("Mug &lt;XL&gt;"));
        assert!(html.contains("In stock: 3"));
        assert!(html.contains(r#"data-product-id="abc""#));
        assert!(html.contains("Add to Cart"));
    }

    #[test]
    fn test_cart_row_dedupes_and_falls_back_to_placeholder() {
        let row = cart_row(&line("Red Red T-Shirt Red Red T-Shirt", 1250, 2));
        assert_eq!(row.name, "Red Red T-Shirt");
        assert_eq!(row.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(row.unit_price, "$12.50");
        assert_eq!(row.line_subtotal, "$25.00");
        assert!(row.can_decrement);

        let html = row.render().unwrap();
        assert!(html.contains("Size: M"));
        assert!(html.contains(PLACEHOLDER_IMAGE));
    }

    #[test]
    fn test_cart_row_disables_decrement_at_one() {
        let row = cart_row(&line("Socks", 500, 1));
        assert!(!row.can_decrement);
        assert!(row.render().unwrap().contains("disabled"));
    }

    #[test]
    fn test_cart_summary() {
        let cart = Cart {
            lines: vec![line("Socks", 500, 3)],
        };
        let summary = cart_summary(&cart);
        assert_eq!(summary.subtotal, "$15.00");
        assert_eq!(summary.shipping, "$10.00");
        assert_eq!(summary.total, "$25.00");
    }

    #[test]
    fn test_order_row_badges() {
        let order = Order {
            id: OrderId::new("17"),
            status: OrderStatus::parse("refunded"),
            total_amount: Price::from_cents(4200),
            shipping_address: None,
            created_at: Some("2024-03-01T12:30:00".to_string()),
            items: Vec::new(),
        };
        let row = order_row(&order);
        assert_eq!(row.badge_class, "bg-secondary");
        assert_eq!(row.status_label, "refunded");
        assert_eq!(row.date, "3/1/2024");
        assert!(row.render().unwrap().contains("View Details"));
    }

    #[test]
    fn test_order_without_items_renders_placeholder_row() {
        let html = order_item_rows(&[]).render().unwrap();
        assert!(html.contains("No items found for this order"));

        let order: Order = serde_json::from_value(json!({"id": 5, "items": null})).unwrap();
        let detail = order_detail(&order);
        assert_eq!(detail.address, "No address provided");
        let html = detail.render().unwrap();
        assert!(html.contains("No items found for this order"));
    }

    #[test]
    fn test_pagination_hidden_for_single_page() {
        let html = pagination(Pagination::new(1, 1)).render().unwrap();
        assert!(html.trim().is_empty());
        let html = pagination(Pagination::new(1, 0)).render().unwrap();
        assert!(html.trim().is_empty());
    }

    #[test]
    fn test_pagination_marks_active_and_disabled() {
        let view = pagination(Pagination::new(1, 3));
        assert_eq!(view.previous, None);
        assert_eq!(view.next, Some(2));
        let html = view.render().unwrap();
        assert!(html.contains("page-item disabled"));
        assert!(html.contains("page-item active"));
    }

    #[test]
    fn test_cart_count_badge_hidden_at_zero() {
        assert!(cart_count_badge(0).render().unwrap().contains("d-none"));
        assert!(!cart_count_badge(2).render().unwrap().contains("d-none"));
    }

    #[test]
    fn test_alert_escapes_message() {
        let html = alert(AlertKind::Danger, "<script>x</script>").render().unwrap();
        assert!(html.contains("alert-danger"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_nav_visibility() {
        let html = nav(false, 0).render().unwrap();
        assert!(html.contains(r#"id="profile-item" class="nav-item d-none""#));
        assert!(html.contains(r#"id="login-item" class="nav-item""#));

        let html = nav(true, 3).render().unwrap();
        assert!(html.contains(r#"id="login-item" class="nav-item d-none""#));
        assert!(html.contains(r#"id="logout-item" class="nav-item""#));
    }

    #[test]
    fn test_profile_card() {
        let user = UserInfo {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@shop.test".to_string()),
            ..Default::default()
        };
        let card = profile_card(&user);
        assert_eq!(card.name, "Ada Lovelace");
        assert_eq!(card.account_type, "Customer");
        assert_eq!(card.joined, "N/A");
    }
}
