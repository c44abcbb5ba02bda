//! Order placement, history and tracking.

use dewdrop_core::{OrderId, OrderStatus};
use tracing::instrument;

use crate::client::{ApiClient, ApiRequest};
use crate::error::{ApiError, Result};
use crate::types::{NewOrder, Order, OrderTracking, Page};

/// Header carrying the client-chosen key that makes order creation safe to
/// replay.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Order endpoints.
pub struct OrdersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> OrdersApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Place an order for the current cart contents.
    ///
    /// `idempotency_key` lets the backend recognize a replay of the same
    /// order (after a token refresh, say) and return the first one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank shipping address.
    #[instrument(skip(self, order))]
    pub async fn create(&self, order: &NewOrder, idempotency_key: &str) -> Result<Order> {
        if order.shipping_address.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "shipping address is required".to_string(),
            ));
        }
        let request = ApiRequest::post("orders/create/")
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .json(order)?;
        self.client.execute(request).await
    }

    /// The signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self) -> Result<Vec<Order>> {
        let page: Page<Order> = self.client.execute(ApiRequest::get("orders/")).await?;
        Ok(page.results)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown order.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.client
            .execute(ApiRequest::get(format!("orders/{id}/")))
            .await
    }

    /// Cancel an order that has not shipped.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend refuses.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order> {
        self.client
            .execute(ApiRequest::post(format!("orders/{id}/cancel/")))
            .await
    }

    /// Cancel `order` after checking locally that its status allows it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for an order past processing.
    pub async fn cancel_if_allowed(&self, order: &Order) -> Result<Order> {
        if !order.status.is_cancellable() {
            return Err(ApiError::InvalidInput(format!(
                "order {} is {} and can no longer be cancelled",
                order.id, order.status
            )));
        }
        self.cancel(order.id).await
    }

    /// Delivery tracking for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn track(&self, id: OrderId) -> Result<OrderTracking> {
        self.client
            .execute(ApiRequest::get(format!("orders/{id}/track/")))
            .await
    }

    /// Orders in a given status, for filtering history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_with_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let page: Page<Order> = self
            .client
            .execute(ApiRequest::get("orders/").query("status", status))
            .await?;
        Ok(page.results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dewdrop_core::{Money, PaymentMethod};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::signed_in_client;

    fn order_json(status: &str) -> serde_json::Value {
        json!({"id": 12, "status": status, "total_amount": "43.20", "items": []})
    }

    #[tokio::test]
    async fn test_create_sends_idempotency_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/create/"))
            .and(header("idempotency-key", "key-1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(order_json("pending")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let order = client
            .orders()
            .create(
                &NewOrder {
                    shipping_address: "1 Dew Lane".to_string(),
                    phone: None,
                    payment_method: PaymentMethod::Cod,
                    notes: None,
                },
                "key-1",
            )
            .await
            .unwrap();

        assert_eq!(order.total, Money::from_cents(4320));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_if_allowed_checks_status() {
        let server = MockServer::start().await;
        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;

        let shipped: Order = serde_json::from_value(order_json("shipped")).unwrap();
        let err = client.orders().cancel_if_allowed(&shipped).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
