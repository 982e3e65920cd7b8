//! Order endpoints.

use secrecy::SecretString;
use serde_json::{Value, json};
use shopfront_core::types::lenient::list_or_empty;
use shopfront_core::{Order, OrderId};
use tracing::instrument;

use super::cart::path_segment;
use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    /// `GET /api/orders`. Orders are read from `orders`; a malformed list is
    /// treated as empty.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all)]
    pub async fn orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let mut data = self
            .call(ApiRequest::get("/api/orders").bearer(Some(token)))
            .await?
            .data;
        let list = match data {
            Value::Array(_) => data,
            _ => data.get_mut("orders").map(Value::take).unwrap_or_default(),
        };
        Ok(list_or_empty(list)?)
    }

    /// `GET /api/orders/{id}`. The order is read from `order`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order(&self, token: &SecretString, id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("/api/orders/{}", path_segment(id.as_str()));
        self.call(ApiRequest::get(path).bearer(Some(token)))
            .await?
            .decode_field("order")
    }

    /// `POST /api/orders`. Places an order for the current cart contents.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip_all)]
    pub async fn place_order(
        &self,
        token: &SecretString,
        shipping_address: &str,
    ) -> Result<(), ApiError> {
        self.call(
            ApiRequest::post("/api/orders")
                .bearer(Some(token))
                .json(json!({ "shipping_address": shipping_address })),
        )
        .await?;
        Ok(())
    }
}
