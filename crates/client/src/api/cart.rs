//! Server-side cart endpoints.
//!
//! Every mutation returns the updated cart, which callers should treat as
//! the new source of truth.

use dewdrop_core::{CartItemId, ProductId};
use serde_json::json;
use tracing::instrument;

use crate::client::{ApiClient, ApiRequest};
use crate::error::{ApiError, Result};
use crate::types::Cart;

/// Cart endpoints.
pub struct CartApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CartApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// The current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self) -> Result<Cart> {
        self.client.execute(ApiRequest::get("cart/")).await
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a zero quantity,
    /// `ApiError::Validation` when stock is insufficient.
    #[instrument(skip(self))]
    pub async fn add(&self, product: ProductId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(ApiError::InvalidInput("quantity must be at least 1".to_string()));
        }
        let request = ApiRequest::post("cart/add/").json(&json!({
            "product_id": product,
            "quantity": quantity,
        }))?;
        self.client.execute(request).await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update(&self, item: CartItemId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return self.remove(item).await;
        }
        let request = ApiRequest::post("cart/update/").json(&json!({
            "item_id": item,
            "quantity": quantity,
        }))?;
        self.client.execute(request).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, item: CartItemId) -> Result<Cart> {
        self.client
            .execute(ApiRequest::post(format!("cart/item/{item}/remove/")))
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn clear(&self) -> Result<()> {
        self.client.execute_unit(ApiRequest::post("cart/clear/")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::signed_in_client;

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/item/3/remove/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let cart = client.cart().update(CartItemId::new(3), 0).await.unwrap();
        assert!(cart.items.is_empty());
    }

    #[tokio::test]
    async fn test_add_sends_product_and_quantity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/add/"))
            .and(body_json(json!({"product_id": 4, "quantity": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": 1, "quantity": 2, "product": {"id": 4, "name": "SPF 50", "price": "21.00"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let cart = client.cart().add(ProductId::new(4), 2).await.unwrap();
        assert_eq!(cart.item_count(), 2);

        let err = client.cart().add(ProductId::new(4), 0).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
