//! Home page, product catalog and add-to-cart.

use shopfront_core::{Price, ProductId};
use shopfront_storefront::controllers::{self, CatalogPage, HomePage, Navigation, PageContext};
use shopfront_storefront::render::{AlertKind, alert};

use crate::CliError;
use crate::output;

pub async fn home(ctx: &PageContext) {
    let navigation = Navigation::load(ctx).await;
    output::nav(&navigation);

    let mut page = HomePage::new();
    page.load_featured(ctx).await;
    output::panel(page.featured(), |cards| output::fragments(cards));
}

pub async fn products(
    ctx: &PageContext,
    search: String,
    min_price: String,
    max_price: String,
    page_number: u32,
) {
    let mut page = CatalogPage::new();
    let inputs = page.inputs_mut();
    inputs.search = search;
    inputs.min_price = min_price;
    inputs.max_price = max_price;

    if page_number > 1 {
        page.go_to_page(ctx, page_number).await;
    } else {
        page.load(ctx).await;
    }

    if let Some(error) = page.filter_error() {
        output::alert(Some(alert(AlertKind::Danger, error.to_string())));
        return;
    }
    output::panel(page.products(), |cards| output::fragments(cards));
    if let Some(pagination) = page.pagination() {
        output::fragment(pagination);
    }
}

/// Add to cart from the catalog page.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` if `price` is not a dollar amount.
pub async fn add_to_cart(
    ctx: &PageContext,
    product_id: &str,
    price: &str,
) -> Result<(), CliError> {
    let price: Price = price
        .parse()
        .map_err(|e| CliError::InvalidArgument(format!("{e}")))?;
    let effects =
        controllers::add_to_cart(ctx, "/products", &ProductId::new(product_id), price).await;
    output::effects(&effects);
    Ok(())
}
