//! Read-only inspection of JWT access tokens.
//!
//! The client never validates signatures (the backend does); it only peeks at
//! the payload to report when a token expires.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// The `exp` claim of a JWT, if `token` is a JWT and carries one.
#[must_use]
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Whether `token` is a JWT whose `exp` is at or before `now`.
///
/// Opaque tokens are never considered expired; only the backend can tell.
#[must_use]
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now)
}
