//! Login, registration and the signed-in user's profile.

use dewdrop_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::MIN_PASSWORD_LEN;
use crate::client::{ApiClient, ApiRequest, Auth};
use crate::error::{ApiError, Result};
use crate::session::{AuthEvent, Session, SessionUser};
use crate::types::{ProfileUpdate, UserProfile};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: Email,
    pub password: SecretString,
    /// Declared allergens, matched against ingredients at checkout.
    pub allergies: Vec<String>,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    password_confirm: &'a str,
    allergies: Vec<String>,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(alias = "access_token")]
    access: String,
    #[serde(default, alias = "refresh_token")]
    refresh: Option<String>,
    user: SessionUser,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self::new(
            response.user,
            SecretString::from(response.access),
            response.refresh.map(SecretString::from),
        )
    }
}

/// Trim, lowercase and de-duplicate an allergy list, keeping first-seen
/// order and dropping blanks.
#[must_use]
pub fn normalize_allergies<I, S>(allergies: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for allergy in allergies {
        let allergy = allergy.as_ref().trim().to_lowercase();
        if !allergy.is_empty() && !normalized.contains(&allergy) {
            normalized.push(allergy);
        }
    }
    normalized
}

fn check_password(password: &SecretString) -> Result<()> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Authentication endpoints.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Sign in and store the session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(ApiError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        let request = ApiRequest::post("auth/login/")
            .auth(Auth::None)
            .json(&json!({
                "username": username,
                "password": password.expose_secret(),
            }))?;
        let response: AuthResponse = self.client.execute(request).await?;
        self.sign_in(response.into())
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a short password or blank
    /// username, `ApiError::Validation` when the backend rejects the data
    /// (e.g. a taken username).
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<Session> {
        let username = registration.username.trim();
        if username.is_empty() {
            return Err(ApiError::InvalidInput("username is required".to_string()));
        }
        check_password(&registration.password)?;

        let password = registration.password.expose_secret();
        let request = ApiRequest::post("auth/register/")
            .auth(Auth::None)
            .json(&RegisterRequest {
                username,
                email: registration.email.as_str(),
                password,
                password_confirm: password,
                allergies: normalize_allergies(&registration.allergies),
            })?;
        let response: AuthResponse = self.client.execute(request).await?;
        self.sign_in(response.into())
    }

    fn sign_in(&self, session: Session) -> Result<Session> {
        self.client.store().save(&session)?;
        info!(user_id = %session.user.id, "Signed in");
        self.client.publish(AuthEvent::SignedIn {
            user_id: session.user.id,
        });
        Ok(session)
    }

    /// Sign out.
    ///
    /// The refresh token is blacklisted server-side on a best-effort basis;
    /// the local session is cleared even if that call fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local session cannot be cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let refresh = self.client.store().refresh_token()?;
        if let Some(refresh) = refresh {
            let request = ApiRequest::post("auth/logout/")
                .auth(Auth::Optional)
                .json(&json!({ "refresh": refresh.expose_secret() }))?;
            if let Err(err) = self.client.execute_unit(request).await {
                warn!(error = %err, "Server-side logout failed");
            }
        }

        self.client.store().clear()?;
        self.client.cache().invalidate_all();
        info!("Signed out");
        self.client.publish(AuthEvent::SignedOut);
        Ok(())
    }

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn profile(&self) -> Result<UserProfile> {
        self.client.execute(ApiRequest::get("auth/profile/")).await
    }

    /// Edit the profile. Allergies are normalized before sending and the
    /// stored session picks up the new list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let mut update = update.clone();
        if let Some(allergies) = update.allergies.take() {
            update.allergies = Some(normalize_allergies(allergies));
        }
        if let Some(email) = update.email.take() {
            let email = Email::parse(&email)
                .map_err(|err| ApiError::InvalidInput(err.to_string()))?;
            update.email = Some(String::from(email));
        }

        let profile: UserProfile = self
            .client
            .execute(ApiRequest::patch("auth/profile/").json(&update)?)
            .await?;

        if let Some(mut session) = self.client.store().load()? {
            session.user.allergies.clone_from(&profile.allergies);
            session.user.email.clone_from(&profile.email);
            self.client.store().save(&session)?;
        }
        Ok(profile)
    }

    /// Change the password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the new password is too short or
    /// equal to the old one.
    #[instrument(skip_all)]
    pub async fn change_password(&self, old: &SecretString, new: &SecretString) -> Result<()> {
        check_password(new)?;
        if old.expose_secret() == new.expose_secret() {
            return Err(ApiError::InvalidInput(
                "new password must differ from the current one".to_string(),
            ));
        }

        let request = ApiRequest::post("auth/change-password/").json(&json!({
            "old_password": old.expose_secret(),
            "new_password": new.expose_secret(),
        }))?;
        self.client.execute_unit(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::{client_with_store, signed_in_client};
    use crate::session::{MemorySessionStore, SessionStore};

    fn auth_body() -> serde_json::Value {
        json!({
            "access": "a1",
            "refresh": "r1",
            "user": {"id": 7, "username": "glowgetter", "allergies": ["fragrance"]}
        })
    }

    #[test]
    fn test_normalize_allergies() {
        assert_eq!(
            normalize_allergies([" Fragrance", "nuts", "", "fragrance ", "NUTS", "Retinol"]),
            vec!["fragrance", "nuts", "retinol"]
        );
    }

    #[tokio::test]
    async fn test_login_stores_session_and_announces_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .and(body_partial_json(json!({"username": "glowgetter"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemorySessionStore::new());
        let client = client_with_store(&server, Arc::clone(&store));
        let mut events = client.subscribe();

        let session = client
            .auth()
            .login(" glowgetter ", &SecretString::from("hunter22"))
            .await
            .unwrap();

        assert_eq!(session.user.username, "glowgetter");
        assert_eq!(
            store.access_token().unwrap().unwrap().expose_secret(),
            "a1"
        );
        assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn { .. }));
    }

    #[tokio::test]
    async fn test_wrong_credentials_do_not_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemorySessionStore::new());
        let client = client_with_store(&server, Arc::clone(&store));

        let err = client
            .auth()
            .login("glowgetter", &SecretString::from("wrong-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "Invalid credentials"));
        assert_eq!(client.refresh_calls(), 0);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_validates_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register/"))
            .and(body_partial_json(json!({
                "email": "new@example.com",
                "allergies": ["fragrance", "nuts"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(auth_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_store(&server, Arc::new(MemorySessionStore::new()));
        let mut registration = Registration {
            username: "glowgetter".to_string(),
            email: Email::parse("new@EXAMPLE.com").unwrap(),
            password: SecretString::from("short"),
            allergies: vec!["Fragrance".to_string(), "nuts".to_string(), "fragrance".to_string()],
        };

        let err = client.auth().register(&registration).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        registration.password = SecretString::from("long enough");
        client.auth().register(&registration).await.unwrap();
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout/"))
            .and(header("authorization", "Bearer a1"))
            .and(body_partial_json(json!({"refresh": "r1"})))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (client, store) = signed_in_client(&server, "a1", Some("r1")).await;
        let mut events = client.subscribe();

        client.auth().logout().await.unwrap();

        assert!(store.load().unwrap().is_none());
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_update_profile_syncs_session_allergies() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/auth/profile/"))
            .and(body_partial_json(json!({"allergies": ["parabens"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "username": "glowgetter",
                "allergies": ["parabens"]
            })))
            .mount(&server)
            .await;

        let (client, store) = signed_in_client(&server, "a1", Some("r1")).await;
        let update = ProfileUpdate {
            allergies: Some(vec![" Parabens ".to_string()]),
            ..ProfileUpdate::default()
        };

        let profile = client.auth().update_profile(&update).await.unwrap();
        assert_eq!(profile.allergies, vec!["parabens"]);
        assert_eq!(store.load().unwrap().unwrap().user.allergies, vec!["parabens"]);
    }

    #[tokio::test]
    async fn test_change_password_rejects_reuse() {
        let server = MockServer::start().await;
        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;

        let same = SecretString::from("same-password");
        let err = client.auth().change_password(&same, &same).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
