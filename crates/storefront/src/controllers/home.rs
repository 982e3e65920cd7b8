//! Home page: featured products.

use shopfront_core::{Price, ProductId};
use tracing::instrument;

use crate::render::{ProductCard, product_card};

use super::shared::{self, Effect, PageContext, Panel};

const PATH: &str = "/";
const NO_FEATURED: &str = "No featured products available at the moment.";
const FEATURED_FAILED: &str = "Error loading featured products. Please try again later.";

#[derive(Debug, Default)]
pub struct HomePage {
    featured: Panel<Vec<ProductCard>>,
}

impl HomePage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn featured(&self) -> &Panel<Vec<ProductCard>> {
        &self.featured
    }

    #[instrument(skip_all)]
    pub async fn load_featured(&mut self, ctx: &PageContext) {
        self.featured = Panel::Loading;
        self.featured = match ctx.api.featured_products().await {
            Ok(products) if products.is_empty() => Panel::Empty(NO_FEATURED),
            Ok(products) => Panel::Loaded(products.iter().map(product_card).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load featured products");
                Panel::Failed(FEATURED_FAILED.to_owned())
            }
        };
    }

    pub async fn add_to_cart(
        &self,
        ctx: &PageContext,
        product_id: &ProductId,
        price: Price,
    ) -> Vec<Effect> {
        shared::add_to_cart(ctx, PATH, product_id, price).await
    }
}
