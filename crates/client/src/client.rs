//! Authenticated storefront API client.
//!
//! [`ApiClient`] tags every authenticated request with the current access
//! token. When the backend answers 401 because that token expired, the
//! client asks the [`RefreshCoordinator`] for a new one and replays the
//! request exactly once. Any other failure is returned as-is.
//!
//! Requests are described by an [`ApiRequest`] rather than a
//! `reqwest::RequestBuilder` so they can be rebuilt for the replay
//! (multipart bodies in particular can only be sent once).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use url::Url;

use crate::api::{
    AdminApi, AuthApi, CartApi, ChatApi, NotificationsApi, OrdersApi, PaymentsApi, ProductsApi,
    SocialApi,
};
use crate::cache::CacheValue;
use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorBody, Result};
use crate::refresh::{HttpTokenRefresher, RefreshCoordinator};
use crate::session::{AuthEvent, Session, SessionStore};

/// Capacity of the auth event channel; slow subscribers miss older events.
const EVENT_CAPACITY: usize = 32;

/// Default `Retry-After` when a 429 carries none.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// =============================================================================
// Requests
// =============================================================================

/// Whether a request carries the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Must be signed in; fails with `NotAuthenticated` otherwise.
    Required,
    /// Sent with the token when signed in, anonymously otherwise.
    Optional,
    /// Never sent with a token (login, registration).
    None,
}

/// A file uploaded in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// An upload from in-memory bytes; the MIME type is guessed from the
    /// file extension.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read an upload from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
enum MultipartField {
    Text(String),
    File(Upload),
}

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<(String, MultipartField)>),
}

impl RequestBody {
    fn push_field(&mut self, name: &str, field: MultipartField) {
        match self {
            Self::Multipart(fields) => fields.push((name.to_string(), field)),
            Self::Empty | Self::Json(_) => *self = Self::Multipart(vec![(name.to_string(), field)]),
        }
    }
}

/// A replayable description of one API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(&'static str, String)>,
    body: RequestBody,
    auth: Auth,
}

impl ApiRequest {
    /// A request to `path`, relative to the API root.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            auth: Auth::Required,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set how the request authenticates (default: [`Auth::Required`]).
    #[must_use]
    pub const fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is set.
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Send `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if `body` cannot be serialized.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add a text field to a multipart body.
    #[must_use]
    pub fn text_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.body.push_field(name, MultipartField::Text(value.into()));
        self
    }

    /// Add a file to a multipart body.
    #[must_use]
    pub fn file_field(mut self, name: &str, upload: Upload) -> Self {
        self.body.push_field(name, MultipartField::File(upload));
        self
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the HTTP connection pool, session store,
/// refresh coordinator and response cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn SessionStore>,
    coordinator: RefreshCoordinator<HttpTokenRefresher>,
    events: broadcast::Sender<AuthEvent>,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a client using `store` for the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let refresher = HttpTokenRefresher::new(http.clone(), &config.base_url)
            .map_err(|err| ApiError::InvalidInput(err.to_string()))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let coordinator = RefreshCoordinator::new(refresher, Arc::clone(&store), events.clone());

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                store,
                coordinator,
                events,
                cache,
            }),
        })
    }

    /// The API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Subscribe to session lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// The current session, if signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn session(&self) -> Result<Option<Session>> {
        Ok(self.inner.store.load()?)
    }

    /// Whether a session is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.inner.store.load(), Ok(Some(_)))
    }

    /// Whether a token refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Number of refresh endpoint calls made by this client.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        self.inner.coordinator.refresh_calls()
    }

    pub(crate) fn store(&self) -> &dyn SessionStore {
        self.inner.store.as_ref()
    }

    pub(crate) fn cache(&self) -> &Cache<String, CacheValue> {
        &self.inner.cache
    }

    pub(crate) fn publish(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // =========================================================================
    // Endpoint groups
    // =========================================================================

    /// Login, registration and the own profile.
    #[must_use]
    pub const fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Catalog, reviews, likes and allergy checks.
    #[must_use]
    pub const fn products(&self) -> ProductsApi<'_> {
        ProductsApi::new(self)
    }

    /// Server-side cart.
    #[must_use]
    pub const fn cart(&self) -> CartApi<'_> {
        CartApi::new(self)
    }

    /// Order placement and history.
    #[must_use]
    pub const fn orders(&self) -> OrdersApi<'_> {
        OrdersApi::new(self)
    }

    /// Payment gateway handoff.
    #[must_use]
    pub const fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi::new(self)
    }

    /// Follow graph, user search and sharing.
    #[must_use]
    pub const fn social(&self) -> SocialApi<'_> {
        SocialApi::new(self)
    }

    /// Direct messages.
    #[must_use]
    pub const fn chat(&self) -> ChatApi<'_> {
        ChatApi::new(self)
    }

    /// Notifications.
    #[must_use]
    pub const fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi::new(self)
    }

    /// Admin dashboard.
    #[must_use]
    pub const fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Execute a request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the transport, status or decoding failure. Expired tokens are
    /// refreshed transparently; see the module docs.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.dispatch(&request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute a request whose response body is irrelevant.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::execute`], minus decoding.
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<()> {
        self.dispatch(&request).await.map(drop)
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let token = match request.auth {
            Auth::None => None,
            Auth::Optional => self.inner.store.access_token()?,
            Auth::Required => Some(
                self.inner
                    .store
                    .access_token()?
                    .ok_or(ApiError::NotAuthenticated)?,
            ),
        };

        let response = self.attempt(request, token.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        let body = ErrorBody::read(response).await;
        let Some(stale) = token.filter(|_| body.is_token_rejection()) else {
            return Err(ApiError::Unauthorized(body.message_or("Unauthorized")));
        };

        debug!("Access token rejected, refreshing");
        let fresh = self.inner.coordinator.refresh(&stale).await?;

        // Replayed once; a second 401 is final.
        let retry = self.attempt(request, Some(&fresh)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            let body = ErrorBody::read(retry).await;
            return Err(ApiError::Unauthorized(body.message_or("Unauthorized")));
        }
        check_status(retry).await
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(&request.path, &request.query)?;
        debug!(url = %url, authenticated = token.is_some(), "Sending request");

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        Ok(builder.send().await?)
    }

    fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidInput(format!("bad endpoint {path:?}: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

fn build_form(fields: &[(String, MultipartField)]) -> Result<Form> {
    let mut form = Form::new();
    for (name, field) in fields {
        form = match field {
            MultipartField::Text(value) => form.text(name.clone(), value.clone()),
            MultipartField::File(upload) => form.part(
                name.clone(),
                Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.mime)?,
            ),
        };
    }
    Ok(form)
}

/// Map a non-401 response to `Ok` or the matching error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok());
    let body = ErrorBody::read(response).await;
    let fallback = status.canonical_reason().unwrap_or("request failed");

    Err(match status {
        StatusCode::BAD_REQUEST => ApiError::Validation(body.message_or(fallback)),
        StatusCode::FORBIDDEN => ApiError::Forbidden(body.message_or(fallback)),
        StatusCode::NOT_FOUND => ApiError::NotFound(body.message_or(fallback)),
        StatusCode::TOO_MANY_REQUESTS => {
            ApiError::RateLimited(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS))
        }
        _ => ApiError::Status {
            status,
            message: body.message_or(fallback),
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::session::MemorySessionStore;
    use crate::session::tests::sample_session;

    /// A client pointed at `server`, signed in with `access`/`refresh`.
    pub async fn signed_in_client(
        server: &MockServer,
        access: &str,
        refresh: Option<&str>,
    ) -> (ApiClient, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::with_session(sample_session(
            access, refresh,
        )));
        (client_with_store(server, Arc::clone(&store)), store)
    }

    pub fn client_with_store(server: &MockServer, store: Arc<MemorySessionStore>) -> ApiClient {
        let config = ClientConfig::new(&format!("{}/api", server.uri())).unwrap();
        ApiClient::new(&config, store).unwrap()
    }

    fn expired() -> ResponseTemplate {
        ResponseTemplate::new(401).set_body_json(json!({"error": "Token has expired"}))
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/"))
            .and(header("authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let orders: Vec<serde_json::Value> =
            client.execute(ApiRequest::get("orders/")).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_requests_carry_no_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("authorization") {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
                }
            })
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let body: serde_json::Value = client
            .execute(ApiRequest::post("auth/login/").auth(Auth::None))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_required_auth_without_session() {
        let server = MockServer::start().await;
        let client = client_with_store(&server, Arc::new(MemorySessionStore::new()));

        let err = client
            .execute_unit(ApiRequest::get("cart/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_request_replayed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart/"))
            .and(header("authorization", "Bearer old"))
            .respond_with(expired())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, store) = signed_in_client(&server, "old", Some("r1")).await;
        let mut events = client.subscribe();

        let cart: crate::types::Cart = client.execute(ApiRequest::get("cart/")).await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(
            store.access_token().unwrap().unwrap().expose_secret(),
            "new"
        );
        assert_eq!(events.recv().await.unwrap(), AuthEvent::TokenRefreshed);
    }

    #[tokio::test]
    async fn test_second_401_is_not_retried_again() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/"))
            .respond_with(expired())
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "old", Some("r1")).await;
        let err = client
            .execute_unit(ApiRequest::get("orders/"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized(msg) if msg == "Token has expired"));
        assert_eq!(client.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_non_token_401_propagates_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/stats/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Authentication credentials were not provided."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, store) = signed_in_client(&server, "a1", Some("r1")).await;
        let err = client
            .execute_unit(ApiRequest::get("admin/stats/"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(client.refresh_calls(), 0);
        assert!(store.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/api/products/99/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
            .mount(&server)
            .await;
        Mock::given(path("/api/cart/add/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"quantity": ["Only 2 left in stock."]})),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/products/"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
            .mount(&server)
            .await;
        Mock::given(path("/api/orders/create/"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;

        let err = client.execute_unit(ApiRequest::get("products/99/")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Not found."));

        let err = client.execute_unit(ApiRequest::post("cart/add/")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "quantity: Only 2 left in stock."));

        let err = client.execute_unit(ApiRequest::get("products/")).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(12)));

        let err = client
            .execute_unit(ApiRequest::post("orders/create/"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: StatusCode::BAD_GATEWAY, ref message } if message == "upstream down"
        ));
    }

    #[tokio::test]
    async fn test_query_parameters_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/"))
            .and(query_param("search", "vitamin c"))
            .and(query_param("page", "2"))
            .and(header_exists("x-request-source"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", None).await;
        client
            .execute_unit(
                ApiRequest::get("products/")
                    .query("search", "vitamin c")
                    .query_opt("page", Some(2))
                    .query_opt("category", None::<u32>)
                    .header("x-request-source", "test"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_multipart_upload_is_rebuilt_on_replay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/banners/"))
            .and(header("authorization", "Bearer old"))
            .respond_with(expired())
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/admin/banners/"))
            .and(header("authorization", "Bearer new"))
            .respond_with(|req: &Request| {
                let body = String::from_utf8_lossy(&req.body);
                if body.contains("name=\"image\"; filename=\"sale.png\"") && body.contains("Summer") {
                    ResponseTemplate::new(201)
                } else {
                    ResponseTemplate::new(400)
                }
            })
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "old", Some("r1")).await;
        client
            .execute_unit(
                ApiRequest::post("admin/banners/")
                    .text_field("title", "Summer")
                    .file_field("image", Upload::new("sale.png", vec![0x89, b'P', b'N', b'G'])),
            )
            .await
            .unwrap();
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("a.PNG"), "image/png");
        assert_eq!(guess_mime("a.jpeg"), "image/jpeg");
        assert_eq!(guess_mime("README"), "application/octet-stream");
    }
}
