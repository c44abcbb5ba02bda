//! Client-side session state.
//!
//! A [`Session`] is the signed-in user plus the access/refresh token pair the
//! backend issued at login. Where it is kept is a capability injected into
//! the client through the [`SessionStore`] trait:
//!
//! - [`MemorySessionStore`] - process-local, used by tests and embedders
//! - [`FileSessionStore`] - a JSON file, so a CLI session survives restarts
//!
//! Session lifecycle changes are broadcast as [`AuthEvent`]s so views such as
//! the cart controller can react to sign-in, sign-out and forced expiry.

mod file;
pub mod jwt;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use chrono::{DateTime, Utc};
use dewdrop_core::{UserId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored session could not be decoded.
    #[error("corrupt session data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The user a session belongs to, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_staff: bool,
    /// Allergens declared at registration or in the profile.
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl SessionUser {
    /// Whether this user may use the admin dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.role == UserRole::Admin
    }
}

/// A signed-in session.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

impl Session {
    /// Create a session from a login response.
    #[must_use]
    pub fn new(user: SessionUser, access_token: SecretString, refresh_token: Option<SecretString>) -> Self {
        Self {
            user,
            access_token,
            refresh_token,
        }
    }

    /// Expiry of the access token, when it is a JWT carrying an `exp` claim.
    #[must_use]
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        jwt::expires_at(self.access_token.expose_secret())
    }

    /// Whether the access token is a JWT that has already expired. The next
    /// authenticated request will trigger a refresh.
    #[must_use]
    pub fn is_access_expired(&self) -> bool {
        jwt::is_expired_at(self.access_token.expose_secret(), Utc::now())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// On-disk representation of a [`Session`].
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredSession {
    user: SessionUser,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            access_token: session.access_token.expose_secret().to_string(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            user: stored.user,
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
        }
    }
}

/// Where the current session is kept.
///
/// Implementations must be cheap to call from request paths; the client
/// reads the access token before every authenticated request.
pub trait SessionStore: Send + Sync {
    /// The current session, if signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Replace the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Forget the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be removed.
    fn clear(&self) -> Result<(), SessionStoreError>;

    /// Install a refreshed token pair. A missing `refresh` keeps the stored
    /// refresh token. Does nothing when signed out, so a refresh finishing
    /// after logout cannot resurrect the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    fn update_tokens(
        &self,
        access: SecretString,
        refresh: Option<SecretString>,
    ) -> Result<(), SessionStoreError> {
        let Some(mut session) = self.load()? else {
            return Ok(());
        };
        session.access_token = access;
        if let Some(refresh) = refresh {
            session.refresh_token = Some(refresh);
        }
        self.save(&session)
    }

    /// The current access token, if signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    fn access_token(&self) -> Result<Option<SecretString>, SessionStoreError> {
        Ok(self.load()?.map(|session| session.access_token))
    }

    /// The current refresh token, if signed in and one was issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    fn refresh_token(&self) -> Result<Option<SecretString>, SessionStoreError> {
        Ok(self.load()?.and_then(|session| session.refresh_token))
    }
}

/// Why a session was ended without the user asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// A token refresh was needed but no refresh token was stored.
    MissingRefreshToken,
    /// The refresh endpoint rejected the refresh token or was unreachable.
    RefreshFailed,
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user logged in (or registered and was signed in).
    SignedIn {
        /// The user now signed in.
        user_id: UserId,
    },
    /// The access token was renewed.
    TokenRefreshed,
    /// The user logged out.
    SignedOut,
    /// The session was evicted; the user must sign in again.
    SessionEnded {
        /// Why the session ended.
        reason: SessionEndReason,
    },
}

impl AuthEvent {
    /// True for events after which no session exists.
    #[must_use]
    pub const fn is_signed_out(&self) -> bool {
        matches!(self, Self::SignedOut | Self::SessionEnded { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub fn sample_user() -> SessionUser {
        SessionUser {
            id: UserId::new(7),
            username: "glowgetter".to_string(),
            email: Some("glow@example.com".to_string()),
            role: UserRole::Customer,
            is_staff: false,
            allergies: vec!["fragrance".to_string()],
        }
    }

    pub fn sample_session(access: &str, refresh: Option<&str>) -> Session {
        Session::new(
            sample_user(),
            SecretString::from(access),
            refresh.map(SecretString::from),
        )
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = sample_session("access-secret", Some("refresh-secret"));
        let debug = format!("{session:?}");
        assert!(debug.contains("glowgetter"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn test_access_expiry() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let jwt = |exp: i64| {
            format!(
                "{}.{}.sig",
                URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
                URL_SAFE_NO_PAD.encode(format!(r#"{{"exp": {exp}}}"#))
            )
        };
        let now = Utc::now().timestamp();

        let expired = sample_session(&jwt(now - 60), Some("r1"));
        assert!(expired.is_access_expired());
        assert_eq!(expired.access_expires_at().unwrap().timestamp(), now - 60);

        assert!(!sample_session(&jwt(now + 3600), Some("r1")).is_access_expired());
        assert!(!sample_session("opaque", Some("r1")).is_access_expired());
    }

    #[test]
    fn test_is_admin() {
        let mut user = sample_user();
        assert!(!user.is_admin());
        user.is_staff = true;
        assert!(user.is_admin());
        user.is_staff = false;
        user.role = UserRole::Admin;
        assert!(user.is_admin());
    }

    #[test]
    fn test_user_deserializes_with_defaults() {
        let user: SessionUser =
            serde_json::from_str(r#"{"id": 3, "username": "dew", "bio": "ignored"}"#)
                .expect("minimal user");
        assert_eq!(user.role, UserRole::Customer);
        assert!(user.allergies.is_empty());
        assert!(user.email.is_none());
    }

    #[test]
    fn test_signed_out_events() {
        assert!(AuthEvent::SignedOut.is_signed_out());
        assert!(
            AuthEvent::SessionEnded {
                reason: SessionEndReason::RefreshFailed
            }
            .is_signed_out()
        );
        assert!(!AuthEvent::TokenRefreshed.is_signed_out());
    }
}
