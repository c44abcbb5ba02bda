//! Shared fixtures for the end-to-end tests.
//!
//! Each test starts a [`wiremock::MockServer`] standing in for the
//! storefront backend and points a real [`ApiClient`] at it, so requests go
//! through the full HTTP stack, refresh coordination included.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dewdrop-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use dewdrop_client::{ApiClient, ClientConfig, Session, SessionStore, SessionUser};
use dewdrop_core::{UserId, UserRole};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The user every fixture session belongs to.
#[must_use]
pub fn customer() -> SessionUser {
    SessionUser {
        id: UserId::new(7),
        username: "glowgetter".to_string(),
        email: Some("glow@example.com".to_string()),
        role: UserRole::Customer,
        is_staff: false,
        allergies: vec!["fragrance".to_string()],
    }
}

/// A session for [`customer`] holding the given tokens.
#[must_use]
pub fn session(access: &str, refresh: Option<&str>) -> Session {
    Session::new(
        customer(),
        SecretString::from(access),
        refresh.map(SecretString::from),
    )
}

/// A client for the mock backend, rooted at `/api/`.
///
/// # Panics
///
/// Panics if the mock server URI is not a valid base URL.
#[must_use]
pub fn client(server: &MockServer, store: Arc<dyn SessionStore>) -> ApiClient {
    let config =
        ClientConfig::new(&format!("{}/api", server.uri())).expect("mock server URI is a base URL");
    ApiClient::new(&config, store).expect("client builds")
}

/// The backend's answer to an expired access token.
#[must_use]
pub fn token_expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid",
    }))
}

/// A product as the catalog serializes it.
#[must_use]
pub fn product(id: i64, name: &str, price: &str) -> Value {
    json!({"id": id, "name": name, "price": price, "stock": 10})
}

/// Mount a refresh endpoint that hands out `access` after `delay`.
pub async fn mount_refresh(server: &MockServer, access: &str, delay: std::time::Duration) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": access }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}
