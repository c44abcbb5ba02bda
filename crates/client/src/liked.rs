//! Optimistic liked-products set.
//!
//! A toggle flips the local state immediately and then tells the backend.
//! If the backend call fails the flip is undone, so the set always ends up
//! matching the last state the backend accepted.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dewdrop_core::ProductId;
use tracing::{instrument, warn};

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::Product;

/// The signed-in user's liked products.
pub struct LikedProducts {
    client: ApiClient,
    liked: Mutex<BTreeSet<ProductId>>,
}

impl LikedProducts {
    /// An empty set; call [`LikedProducts::load`] to fill it.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            liked: Mutex::new(BTreeSet::new()),
        }
    }

    /// Replace the set with the backend's liked list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the set is left unchanged.
    pub async fn load(&self) -> Result<()> {
        let products = self.client.products().liked().await?;
        *self.lock() = products.iter().map(|product| product.id).collect();
        Ok(())
    }

    /// Pick up the `is_liked` flags of freshly fetched products.
    pub fn observe(&self, products: &[Product]) {
        let mut liked = self.lock();
        for product in products {
            if product.is_liked {
                liked.insert(product.id);
            } else {
                liked.remove(&product.id);
            }
        }
    }

    #[must_use]
    pub fn is_liked(&self, id: ProductId) -> bool {
        self.lock().contains(&id)
    }

    /// Liked product IDs in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.lock().iter().copied().collect()
    }

    /// Flip the liked state of a product and return the new state.
    ///
    /// # Errors
    ///
    /// Returns the backend failure after restoring the previous state.
    #[instrument(skip(self))]
    pub async fn toggle(&self, id: ProductId) -> Result<bool> {
        let now_liked = {
            let mut liked = self.lock();
            if liked.remove(&id) {
                false
            } else {
                liked.insert(id);
                true
            }
        };

        let products = self.client.products();
        let result = if now_liked {
            products.like(id).await
        } else {
            products.unlike(id).await
        };

        if let Err(err) = result {
            warn!(product_id = %id, error = %err, "Like toggle failed, rolling back");
            let mut liked = self.lock();
            if now_liked {
                liked.remove(&id);
            } else {
                liked.insert(id);
            }
            return Err(err);
        }
        Ok(now_liked)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<ProductId>> {
        self.liked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
