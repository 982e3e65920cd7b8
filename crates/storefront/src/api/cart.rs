//! Cart endpoints.

use secrecy::SecretString;
use serde_json::json;
use shopfront_core::types::lenient::count_from_value;
use shopfront_core::{Cart, CartItemId, Price, ProductId};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

/// Encode an id for use as a single path segment.
pub(super) fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

impl ApiClient {
    /// `GET /api/cart`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all)]
    pub async fn cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        self.call_decode(ApiRequest::get("/api/cart").bearer(Some(token)))
            .await
    }

    /// `GET /api/cart/count`. Works with or without a token.
    ///
    /// A missing or malformed count is reported as zero.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all, fields(authenticated = token.is_some()))]
    pub async fn cart_count(&self, token: Option<&SecretString>) -> Result<u32, ApiError> {
        let response = self
            .call(ApiRequest::get("/api/cart/count").bearer(token))
            .await?;
        Ok(response
            .data
            .get("count")
            .and_then(count_from_value)
            .unwrap_or(0))
    }

    /// `POST /api/cart/add` with a quantity of one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, price = %price))]
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        price: Price,
    ) -> Result<(), ApiError> {
        let body = json!({
            "product_id": product_id,
            "quantity": 1,
            "price": price,
        });
        self.call(ApiRequest::post("/api/cart/add").bearer(Some(token)).json(body))
            .await?;
        Ok(())
    }

    /// `PUT /api/cart/update/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        token: &SecretString,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let path = format!("/api/cart/update/{}", path_segment(item_id.as_str()));
        self.call(
            ApiRequest::put(path)
                .bearer(Some(token))
                .json(json!({ "quantity": quantity })),
        )
        .await?;
        Ok(())
    }

    /// `DELETE /api/cart/remove/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &SecretString,
        item_id: &CartItemId,
    ) -> Result<(), ApiError> {
        let path = format!("/api/cart/remove/{}", path_segment(item_id.as_str()));
        self.call(ApiRequest::delete(path).bearer(Some(token)))
            .await?;
        Ok(())
    }
}
