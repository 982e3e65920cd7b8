//! Home page, catalog browsing and add-to-cart against the fake API.

#![allow(clippy::unwrap_used)]

use shopfront_core::{Price, ProductId};
use shopfront_integration_tests::{FakeApi, PAGE_SIZE};
use shopfront_storefront::controllers::{CatalogPage, Effect, HomePage, Panel, SESSION_EXPIRED};
use shopfront_storefront::error::ValidationError;

fn card_ids(page: &CatalogPage) -> Vec<String> {
    page.products()
        .loaded()
        .map(|cards| cards.iter().map(|c| c.id.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_home_shows_featured_products() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let mut page = HomePage::new();

    page.load_featured(&ctx).await;

    let cards = page.featured().loaded().unwrap();
    assert_eq!(cards.len(), 3);
    assert_eq!(cards.first().unwrap().name, "T-Shirt 1");
    assert_eq!(cards.first().unwrap().price, "$1.50");
}

#[tokio::test]
async fn test_home_without_featured_products() {
    let api = FakeApi::start().await;
    api.state().featured.clear();
    let ctx = api.guest();
    let mut page = HomePage::new();

    page.load_featured(&ctx).await;

    assert_eq!(
        page.featured(),
        &Panel::Empty("No featured products available at the moment.")
    );
}

#[tokio::test]
async fn test_catalog_pages_through_results() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let mut page = CatalogPage::new();

    page.load(&ctx).await;
    assert_eq!(card_ids(&page).len(), PAGE_SIZE);
    let pagination = page.pagination().unwrap();
    assert!(pagination.visible);
    assert_eq!(pagination.previous, None);
    assert_eq!(pagination.next, Some(2));

    page.go_to_page(&ctx, 3).await;
    assert_eq!(page.current_page(), 3);
    assert_eq!(card_ids(&page), ["p21", "p22", "p23", "p24", "p25"]);
    let pagination = page.pagination().unwrap();
    assert_eq!(pagination.previous, Some(2));
    assert_eq!(pagination.next, None);
}

#[tokio::test]
async fn test_search_filters_and_reset() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let mut page = CatalogPage::new();

    page.inputs_mut().search = "mug".to_string();
    page.search(&ctx).await;

    assert_eq!(card_ids(&page), ["p5", "p10", "p15", "p20", "p25"]);
    assert!(!page.pagination().unwrap().visible);

    page.inputs_mut().min_price = "10".to_string();
    page.inputs_mut().max_price = "20".to_string();
    page.apply_filters(&ctx).await;
    assert_eq!(card_ids(&page), ["p10", "p15"]);

    page.reset_filters(&ctx).await;
    assert_eq!(card_ids(&page).len(), PAGE_SIZE);
    assert!(page.inputs().search.is_empty());
}

#[tokio::test]
async fn test_page_click_keeps_search() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let mut page = CatalogPage::new();
    page.inputs_mut().search = "t-shirt".to_string();
    page.search(&ctx).await;
    assert_eq!(page.pagination().unwrap().next, Some(2));

    page.go_to_page(&ctx, 2).await;

    let ids = card_ids(&page);
    assert_eq!(ids.len(), PAGE_SIZE);
    assert!(!ids.iter().any(|id| id == "p25"));
    assert_eq!(page.inputs().search, "t-shirt");
    assert_eq!(page.pagination().unwrap().next, None);
}

#[tokio::test]
async fn test_no_results_hides_pagination() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let mut page = CatalogPage::new();

    page.inputs_mut().search = "teapot".to_string();
    page.search(&ctx).await;

    assert_eq!(
        page.products(),
        &Panel::Empty("No products found. Try different search criteria.")
    );
    assert!(page.pagination().is_none());
}

#[tokio::test]
async fn test_invalid_price_is_not_sent() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let mut page = CatalogPage::new();

    page.inputs_mut().min_price = "cheap".to_string();
    page.apply_filters(&ctx).await;

    assert_eq!(page.filter_error(), Some(ValidationError::InvalidPrice));
    assert_eq!(api.state().count("GET /api/products"), 0);
}

#[tokio::test]
async fn test_catalog_server_error() {
    let api = FakeApi::start().await;
    api.state().catalog_down = true;
    let ctx = api.guest();
    let mut page = CatalogPage::new();

    page.load(&ctx).await;

    assert_eq!(
        page.products(),
        &Panel::Failed("Error loading products. Please try again later.".to_string())
    );
    assert!(page.pagination().is_none());
}

#[tokio::test]
async fn test_add_to_cart_updates_badge() {
    let api = FakeApi::start().await;
    let ctx = api.ada();
    let page = CatalogPage::new();

    let effects = page
        .add_to_cart(&ctx, &ProductId::new("p3"), "3.50".parse::<Price>().unwrap())
        .await;

    assert_eq!(
        effects.first().and_then(Effect::alert_message),
        Some("Product added to cart!")
    );
    assert_eq!(effects.last(), Some(&Effect::CartCount(4)));
    let state = api.state();
    assert_eq!(state.count("POST /api/cart/add"), 1);
}

#[tokio::test]
async fn test_add_to_cart_as_guest_goes_to_login() {
    let api = FakeApi::start().await;
    let ctx = api.guest();
    let page = HomePage::new();

    let effects = page
        .add_to_cart(&ctx, &ProductId::new("p3"), Price::from_cents(350))
        .await;

    assert_eq!(effects, vec![Effect::navigate("/login?redirect=/")]);
    assert!(api.state().requests.is_empty());
}

#[tokio::test]
async fn test_add_to_cart_with_expired_token() {
    let api = FakeApi::start().await;
    api.state().token_expired = true;
    let ctx = api.ada();
    let page = CatalogPage::new();

    let effects = page
        .add_to_cart(&ctx, &ProductId::new("p3"), Price::from_cents(350))
        .await;

    assert_eq!(
        effects.first().and_then(Effect::alert_message),
        Some(SESSION_EXPIRED)
    );
    assert_eq!(
        effects.last(),
        Some(&Effect::navigate("/login?redirect=/products"))
    );
    assert!(!ctx.session.is_authenticated());
}

#[tokio::test]
async fn test_add_unknown_product_shows_server_message() {
    let api = FakeApi::start().await;
    let ctx = api.ada();
    let page = CatalogPage::new();

    let effects = page
        .add_to_cart(&ctx, &ProductId::new("p999"), Price::from_cents(100))
        .await;

    assert_eq!(
        effects.first().and_then(Effect::alert_message),
        Some("Failed to add product to cart: Product not found")
    );
    assert_eq!(effects.len(), 1);
}
