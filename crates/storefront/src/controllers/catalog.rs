//! Product catalog: search, price filters, pagination.
//!
//! Every fetch reads the current search box and price inputs, so changing
//! page keeps the active search and filters.

use shopfront_core::{Pagination, Price, ProductId, ProductQuery};
use tracing::instrument;

use crate::error::ValidationError;
use crate::render::{PaginationView, ProductCard, pagination, product_card};

use super::shared::{self, Effect, PageContext, Panel};

const PATH: &str = "/products";
const NO_PRODUCTS: &str = "No products found. Try different search criteria.";
const PRODUCTS_FAILED: &str = "Error loading products. Please try again later.";

/// Text currently typed into the search box and price inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogInputs {
    pub search: String,
    pub min_price: String,
    pub max_price: String,
}

impl CatalogInputs {
    /// Build the listing query for `page`.
    fn query(&self, page: u32) -> Result<ProductQuery, ValidationError> {
        Ok(ProductQuery::page(page)
            .with_search(&self.search)
            .with_price_range(
                parse_price(&self.min_price)?,
                parse_price(&self.max_price)?,
            ))
    }
}

/// Blank means no bound.
fn parse_price(input: &str) -> Result<Option<Price>, ValidationError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .parse::<Price>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidPrice)
}

#[derive(Debug, Default)]
pub struct CatalogPage {
    inputs: CatalogInputs,
    current_page: u32,
    products: Panel<Vec<ProductCard>>,
    pagination: Option<PaginationView>,
    filter_error: Option<ValidationError>,
}

impl CatalogPage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn inputs(&self) -> &CatalogInputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut CatalogInputs {
        &mut self.inputs
    }

    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub const fn products(&self) -> &Panel<Vec<ProductCard>> {
        &self.products
    }

    /// The pagination control, absent for empty or failed listings.
    #[must_use]
    pub const fn pagination(&self) -> Option<&PaginationView> {
        self.pagination.as_ref()
    }

    /// Inline error next to the price inputs.
    #[must_use]
    pub const fn filter_error(&self) -> Option<ValidationError> {
        self.filter_error
    }

    /// Initial load.
    pub async fn load(&mut self, ctx: &PageContext) {
        self.fetch(ctx, 1).await;
    }

    /// Enter in the search box or the search button.
    pub async fn search(&mut self, ctx: &PageContext) {
        self.fetch(ctx, 1).await;
    }

    pub async fn apply_filters(&mut self, ctx: &PageContext) {
        self.fetch(ctx, 1).await;
    }

    /// Clear search and price inputs, then reload the first page.
    pub async fn reset_filters(&mut self, ctx: &PageContext) {
        self.inputs = CatalogInputs::default();
        self.fetch(ctx, 1).await;
    }

    pub async fn go_to_page(&mut self, ctx: &PageContext, page: u32) {
        self.fetch(ctx, page).await;
    }

    pub async fn add_to_cart(
        &self,
        ctx: &PageContext,
        product_id: &ProductId,
        price: Price,
    ) -> Vec<Effect> {
        shared::add_to_cart(ctx, PATH, product_id, price).await
    }

    #[instrument(skip(self, ctx), fields(search = %self.inputs.search))]
    async fn fetch(&mut self, ctx: &PageContext, page: u32) {
        let query = match self.inputs.query(page) {
            Ok(query) => query,
            Err(e) => {
                self.filter_error = Some(e);
                return;
            }
        };
        self.filter_error = None;
        self.products = Panel::Loading;
        self.pagination = None;

        match ctx.api.list_products(&query).await {
            Ok(listing) if listing.products.is_empty() => {
                self.current_page = query.page_number();
                self.products = Panel::Empty(NO_PRODUCTS);
            }
            Ok(listing) => {
                self.current_page = query.page_number();
                self.products = Panel::Loaded(listing.products.iter().map(product_card).collect());
                self.pagination = Some(pagination(Pagination::new(
                    self.current_page,
                    listing.page_count(),
                )));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load products");
                self.products = Panel::Failed(PRODUCTS_FAILED.to_owned());
            }
        }
    }
}
