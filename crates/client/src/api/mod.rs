//! Typed wrappers over the storefront endpoints.
//!
//! Each group is a short-lived facade borrowed from [`ApiClient`]:
//!
//! ```ignore
//! let product = client.products().get(ProductId::new(3)).await?;
//! client.cart().add(product.id, 2).await?;
//! ```
//!
//! [`ApiClient`]: crate::ApiClient

mod admin;
mod auth;
mod cart;
mod chat;
mod notifications;
mod orders;
mod payments;
mod products;
mod social;

pub use admin::AdminApi;
pub use auth::{AuthApi, Registration, normalize_allergies};
pub use cart::CartApi;
pub use chat::{ChatApi, MAX_MESSAGE_CHARS};
pub use notifications::NotificationsApi;
pub use orders::OrdersApi;
pub use payments::PaymentsApi;
pub use products::{ProductFilter, ProductsApi};
pub use social::SocialApi;

/// Minimum password length accepted at registration and password change.
pub const MIN_PASSWORD_LEN: usize = 8;
