//! Allergy-gated checkout.
//!
//! Before an order is created, every distinct product in the cart is
//! checked against the customer's declared allergies. Any match stops the
//! checkout with a warning; the customer can then confirm and place the
//! order anyway.

use dewdrop_core::{PaymentMethod, ProductId};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cart::CartController;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::types::{AllergyReport, NewOrder, Order, PaymentSession};

/// How a checkout attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// The order was created.
    Placed {
        order: Order,
        /// Gateway handoff for online payments. `None` for cash on delivery,
        /// or when initiating the payment failed (retry with
        /// `payments().initiate`).
        payment: Option<PaymentSession>,
    },
    /// Products in the cart contain allergens the customer declared. No
    /// order was created.
    AllergyWarning(Vec<AllergyReport>),
}

/// Places orders from a [`CartController`]'s cart.
pub struct CheckoutFlow<'a> {
    client: &'a ApiClient,
    cart: &'a CartController,
}

impl<'a> CheckoutFlow<'a> {
    #[must_use]
    pub const fn new(client: &'a ApiClient, cart: &'a CartController) -> Self {
        Self { client, cart }
    }

    /// Check the cart for allergens, then place the order if none match.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` when signed out,
    /// `ApiError::InvalidInput` for an empty cart, or the first failing
    /// request.
    #[instrument(skip_all)]
    pub async fn place_order(&self, order: &NewOrder) -> Result<CheckoutOutcome> {
        let products = self.cart_products().await?;

        let mut flagged = Vec::new();
        for product in products {
            let report = self.client.products().allergy_check(product).await?;
            if report.has_allergens {
                flagged.push(report);
            }
        }

        if !flagged.is_empty() {
            warn!(products = flagged.len(), "Cart contains declared allergens");
            return Ok(CheckoutOutcome::AllergyWarning(flagged));
        }
        self.submit(order).await
    }

    /// Place the order without the allergy check, once the customer has
    /// seen the warning and confirmed.
    ///
    /// # Errors
    ///
    /// Same as [`CheckoutFlow::place_order`].
    #[instrument(skip_all)]
    pub async fn place_order_acknowledging_allergens(
        &self,
        order: &NewOrder,
    ) -> Result<CheckoutOutcome> {
        self.cart_products().await?;
        self.submit(order).await
    }

    /// Distinct products in the freshly loaded cart, in cart order.
    async fn cart_products(&self) -> Result<Vec<ProductId>> {
        // Rehydrating while signed out only empties the local cart.
        if !self.client.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        self.cart.rehydrate().await?;
        let mut products: Vec<ProductId> = Vec::new();
        for line in self.cart.lines() {
            if !products.contains(&line.product.id) {
                products.push(line.product.id);
            }
        }
        if products.is_empty() {
            return Err(ApiError::InvalidInput("cart is empty".to_string()));
        }
        Ok(products)
    }

    async fn submit(&self, new_order: &NewOrder) -> Result<CheckoutOutcome> {
        let key = Uuid::new_v4().to_string();
        let order = self.client.orders().create(new_order, &key).await?;
        info!(order_id = %order.id, total = %order.total, "Order placed");

        // The backend empties the cart when the order is created.
        if let Err(err) = self.cart.rehydrate().await {
            warn!(error = %err, "Failed to reload cart after checkout");
        }

        let payment = match new_order.payment_method {
            PaymentMethod::Cod => None,
            PaymentMethod::Online => {
                match self
                    .client
                    .payments()
                    .initiate(order.id, PaymentMethod::Online)
                    .await
                {
                    Ok(payment) => Some(payment),
                    Err(err) => {
                        warn!(order_id = %order.id, error = %err, "Failed to initiate payment");
                        None
                    }
                }
            }
        };

        Ok(CheckoutOutcome::Placed { order, payment })
    }
}
