//! Payment gateway handoff.

use dewdrop_core::{OrderId, PaymentMethod};
use serde_json::json;
use tracing::instrument;

use crate::client::{ApiClient, ApiRequest};
use crate::error::{ApiError, Result};
use crate::types::PaymentSession;

/// Payment endpoints.
pub struct PaymentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PaymentsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Start paying for an order. For online payments the returned session
    /// carries the gateway URL to send the customer to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn initiate(&self, order: OrderId, method: PaymentMethod) -> Result<PaymentSession> {
        let request = ApiRequest::post("payments/initiate/").json(&json!({
            "order_id": order,
            "payment_method": method,
        }))?;
        self.client.execute(request).await
    }

    /// Confirm a payment with the reference the gateway returned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank reference.
    #[instrument(skip(self))]
    pub async fn verify(&self, order: OrderId, reference: &str) -> Result<PaymentSession> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ApiError::InvalidInput(
                "payment reference is required".to_string(),
            ));
        }
        let request = ApiRequest::post("payments/verify/").json(&json!({
            "order_id": order,
            "reference": reference,
        }))?;
        self.client.execute(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dewdrop_core::PaymentStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::signed_in_client;

    #[tokio::test]
    async fn test_initiate_and_verify() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payments/initiate/"))
            .and(body_json(json!({"order_id": 12, "payment_method": "online"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "order_id": 12,
                "reference": "pay_123",
                "payment_url": "https://pay.example.com/pay_123"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/payments/verify/"))
            .and(body_json(json!({"order_id": 12, "reference": "pay_123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "order_id": 12,
                "reference": "pay_123",
                "status": "paid"
            })))
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let session = client
            .payments()
            .initiate(OrderId::new(12), PaymentMethod::Online)
            .await
            .unwrap();
        assert_eq!(session.status, PaymentStatus::Pending);
        assert!(session.payment_url.is_some());

        let verified = client
            .payments()
            .verify(OrderId::new(12), " pay_123 ")
            .await
            .unwrap();
        assert_eq!(verified.status, PaymentStatus::Paid);
    }
}
