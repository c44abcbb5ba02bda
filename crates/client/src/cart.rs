//! Client-side cart state.
//!
//! [`CartController`] keeps the last cart the backend returned and derives
//! totals from it. Every mutation goes through the API and installs the
//! cart from the response. A background task watches the session: signing
//! out (or a forced session end) empties the cart, signing in reloads it.

use std::sync::Arc;

use dewdrop_core::{CartItemId, CartTotals, ProductId};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::client::ApiClient;
use crate::error::Result;
use crate::session::AuthEvent;
use crate::types::{Cart, CartLine};

/// Owns the displayed cart.
pub struct CartController {
    client: ApiClient,
    state: Arc<watch::Sender<Cart>>,
    watcher: JoinHandle<()>,
}

impl CartController {
    /// An empty controller watching `client`'s session. Must be created
    /// inside a tokio runtime.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let state = Arc::new(watch::Sender::new(Cart::default()));
        let watcher = tokio::spawn(watch_session(
            client.clone(),
            client.subscribe(),
            Arc::clone(&state),
        ));
        Self {
            client,
            state,
            watcher,
        }
    }

    /// Reload the cart from the backend. Signed out, the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the local cart is kept.
    #[instrument(skip(self))]
    pub async fn rehydrate(&self) -> Result<()> {
        rehydrate(&self.client, &self.state).await
    }

    /// Lines in backend order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.state.borrow().items.clone()
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.state.borrow().item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    /// Subtotal, tax and total.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.state.borrow().totals()
    }

    /// Observe cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn add(&self, product: ProductId, quantity: u32) -> Result<()> {
        let cart = self.client.cart().add(product, quantity).await?;
        self.state.send_replace(cart);
        Ok(())
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn set_quantity(&self, item: CartItemId, quantity: u32) -> Result<()> {
        let cart = self.client.cart().update(item, quantity).await?;
        self.state.send_replace(cart);
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn remove(&self, item: CartItemId) -> Result<()> {
        let cart = self.client.cart().remove(item).await?;
        self.state.send_replace(cart);
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn clear(&self) -> Result<()> {
        self.client.cart().clear().await?;
        self.state.send_replace(Cart::default());
        Ok(())
    }
}

impl Drop for CartController {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

async fn rehydrate(client: &ApiClient, state: &watch::Sender<Cart>) -> Result<()> {
    if !client.is_authenticated() {
        state.send_replace(Cart::default());
        return Ok(());
    }

    let cart = client.cart().get().await?;
    // A sign-out may have landed while the request was in flight.
    if client.is_authenticated() {
        debug!(lines = cart.items.len(), "Cart rehydrated");
        state.send_replace(cart);
    }
    Ok(())
}

async fn watch_session(
    client: ApiClient,
    mut events: broadcast::Receiver<AuthEvent>,
    state: Arc<watch::Sender<Cart>>,
) {
    loop {
        match events.recv().await {
            Ok(event) if event.is_signed_out() => {
                debug!(?event, "Session gone, emptying cart");
                state.send_replace(Cart::default());
            }
            Ok(AuthEvent::SignedIn { .. }) => {
                if let Err(err) = rehydrate(&client, &state).await {
                    warn!(error = %err, "Failed to load cart after sign-in");
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "Cart watcher lagged, re-reading session");
                if !client.is_authenticated() {
                    state.send_replace(Cart::default());
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use dewdrop_core::Money;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::signed_in_client;

    fn cart_body() -> serde_json::Value {
        json!({"items": [
            {"id": 1, "quantity": 2, "product": {"id": 4, "name": "SPF 50", "price": "21.00"}},
            {"id": 2, "quantity": 1, "product": {"id": 9, "name": "Cleanser", "price": "13.50"}}
        ]})
    }

    async fn mount_cart(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/cart/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_rehydrate_derives_totals() {
        let server = MockServer::start().await;
        mount_cart(&server).await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let cart = CartController::new(client);
        cart.rehydrate().await.unwrap();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.lines().len(), 2);
        let totals = cart.totals();
        assert_eq!(totals.subtotal, Money::from_cents(5550));
        // 55.50 * 8% = 4.44
        assert_eq!(totals.tax, Money::from_cents(444));
        assert_eq!(totals.total, Money::from_cents(5994));
    }

    #[tokio::test]
    async fn test_sign_out_empties_cart() {
        let server = MockServer::start().await;
        mount_cart(&server).await;

        let (client, _) = signed_in_client(&server, "a1", None).await;
        let cart = CartController::new(client.clone());
        cart.rehydrate().await.unwrap();
        assert!(!cart.is_empty());

        let mut changes = cart.subscribe();
        client.auth().logout().await.unwrap();

        tokio::time::timeout(
            Duration::from_secs(2),
            changes.wait_for(|cart| cart.items.is_empty()),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cart.totals(), CartTotals::default());
    }

    #[tokio::test]
    async fn test_signed_out_rehydrate_is_empty_without_request() {
        let server = MockServer::start().await;
        let (client, store) = signed_in_client(&server, "a1", None).await;
        crate::session::SessionStore::clear(store.as_ref()).unwrap();

        let cart = CartController::new(client);
        cart.rehydrate().await.unwrap();
        assert!(cart.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
