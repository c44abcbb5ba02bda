//! Dewdrop storefront client.
//!
//! An authenticated client for the Dewdrop skincare storefront's REST API.
//! The interesting part is [`ApiClient`]'s handling of expired access
//! tokens: concurrent requests that hit a 401 share a single refresh call,
//! are replayed once with the new token, and a failed refresh ends the
//! session for everyone (see [`refresh`]).
//!
//! On top of the client sit typed endpoint wrappers ([`api`]), the cart
//! controller with its derived totals ([`CartController`]), the
//! allergy-gated checkout ([`CheckoutFlow`]) and the optimistic liked set
//! ([`LikedProducts`]).
//!
//! ```ignore
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileSessionStore::new(&config.session_file));
//! let client = ApiClient::new(&config, store)?;
//!
//! client.auth().login("glowgetter", &password).await?;
//! let page = client.products().list(&ProductFilter::default()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
mod cache;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod liked;
pub mod refresh;
pub mod session;
pub mod types;

pub use api::{ProductFilter, Registration};
pub use cart::CartController;
pub use checkout::{CheckoutFlow, CheckoutOutcome};
pub use client::{ApiClient, ApiRequest, Auth, Upload};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, Result};
pub use liked::LikedProducts;
pub use refresh::{RefreshCoordinator, RefreshError, TokenRefresher};
pub use session::{
    AuthEvent, FileSessionStore, MemorySessionStore, Session, SessionEndReason, SessionStore,
    SessionUser,
};
