//! Product listing endpoints.

use serde_json::Value;
use shopfront_core::types::lenient::list_or_empty;
use shopfront_core::{Product, ProductPage, ProductQuery};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    /// `GET /api/products` with page, search and price filters.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, query), fields(page = query.page_number(), search = ?query.search))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        self.call_decode(ApiRequest::get("/api/products").query(query.to_pairs()))
            .await
    }

    /// `GET /api/products/featured`.
    ///
    /// Accepts a bare array or an object with a `products` array.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let mut data = self
            .call(ApiRequest::get("/api/products/featured"))
            .await?
            .data;
        let list = match data {
            Value::Array(_) => data,
            _ => data.get_mut("products").map(Value::take).unwrap_or_default(),
        };
        Ok(list_or_empty(list)?)
    }
}
