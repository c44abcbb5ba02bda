//! Single-flight access token refresh.
//!
//! When several requests discover at once that the access token expired,
//! exactly one of them (the leader) calls the refresh endpoint. The others
//! queue behind it and are handed the leader's result, in arrival order.
//!
//! ```text
//!            ┌──────── first 401 ────────┐
//!   Idle ────┤                           ├──▶ Refreshing { waiters }
//!            └─ token already replaced ──┘        │  later 401s enqueue
//!                 (return current token)          ▼
//!                                   leader finishes: state ← Idle,
//!                                   every waiter gets the same result
//! ```
//!
//! A terminal failure (no refresh token, or the refresh call failing) clears
//! the session store and publishes [`AuthEvent::SessionEnded`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::ErrorBody;
use crate::session::{AuthEvent, SessionEndReason, SessionStore};

/// Refresh endpoint, relative to the API root.
pub const REFRESH_PATH: &str = "auth/refresh/";

/// Why a token refresh did not produce a new access token.
///
/// `Clone` so that every queued request can receive the same failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The session has no refresh token to exchange.
    #[error("no refresh token stored")]
    MissingRefreshToken,

    /// The refresh endpoint answered with an error.
    #[error("refresh rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Backend error message.
        message: String,
    },

    /// The refresh request never got an answer.
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// The session store could not be read or updated.
    #[error("session store: {0}")]
    Store(String),

    /// The request performing the refresh was dropped before it finished.
    #[error("refresh was interrupted before completing")]
    Interrupted,
}

/// Tokens returned by a successful refresh.
#[derive(Clone)]
pub struct RefreshedTokens {
    /// The new access token.
    pub access: SecretString,
    /// A rotated refresh token, when the backend issues one.
    pub refresh: Option<SecretString>,
}

/// Exchanges a refresh token for a new access token.
pub trait TokenRefresher: Send + Sync {
    /// Perform the exchange.
    fn refresh(
        &self,
        refresh_token: &SecretString,
    ) -> impl Future<Output = Result<RefreshedTokens, RefreshError>> + Send;
}

type Waiter = oneshot::Sender<Result<SecretString, RefreshError>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

/// How a caller takes part in a refresh.
enum Role {
    /// Perform the refresh.
    Leader,
    /// Wait for the leader's result.
    Follower(oneshot::Receiver<Result<SecretString, RefreshError>>),
    /// The token was already replaced; use this one.
    Settled(SecretString),
}

/// Coordinates token refreshes so that at most one is in flight.
pub struct RefreshCoordinator<R> {
    refresher: R,
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<AuthEvent>,
    state: Mutex<RefreshState>,
    refresh_calls: AtomicU64,
}

impl<R: TokenRefresher> RefreshCoordinator<R> {
    /// Create a coordinator over `store`, publishing lifecycle changes on
    /// `events`.
    pub fn new(refresher: R, store: Arc<dyn SessionStore>, events: broadcast::Sender<AuthEvent>) -> Self {
        Self {
            refresher,
            store,
            events,
            state: Mutex::new(RefreshState::Idle),
            refresh_calls: AtomicU64::new(0),
        }
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Number of callers waiting on the in-flight refresh.
    pub fn queued(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    /// Number of times the refresh endpoint has been called.
    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Obtain an access token to replace `stale`, the token a request was
    /// rejected with.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; every caller queued behind the same
    /// refresh receives the same error. With no session stored at all, returns
    /// `RefreshError::MissingRefreshToken` without ending it a second time.
    pub async fn refresh(&self, stale: &SecretString) -> Result<SecretString, RefreshError> {
        match self.join(stale)? {
            Role::Settled(token) => {
                debug!("Access token already replaced, reusing it");
                Ok(token)
            }
            Role::Follower(receiver) => receiver.await.unwrap_or(Err(RefreshError::Interrupted)),
            Role::Leader => {
                let guard = LeaderGuard {
                    state: &self.state,
                    armed: true,
                };
                let result = self.run_refresh().await;
                let waiters = guard.release();
                if !waiters.is_empty() {
                    debug!(waiters = waiters.len(), "Resolving queued requests");
                }
                for waiter in waiters {
                    // A waiter whose request was dropped has nobody listening.
                    let _ = waiter.send(result.clone());
                }
                result
            }
        }
    }

    fn join(&self, stale: &SecretString) -> Result<Role, RefreshError> {
        let mut state = self.lock_state();

        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (sender, receiver) = oneshot::channel();
            waiters.push(sender);
            debug!(position = waiters.len(), "Refresh in flight, queueing request");
            return Ok(Role::Follower(receiver));
        }

        // A refresh that finished after this request was sent has already
        // installed a newer token.
        let current = self
            .store
            .access_token()
            .map_err(|err| RefreshError::Store(err.to_string()))?;
        let Some(current) = current else {
            // The session already ended and that was announced once.
            debug!("No session to refresh");
            return Err(RefreshError::MissingRefreshToken);
        };
        if current.expose_secret() != stale.expose_secret() {
            return Ok(Role::Settled(current));
        }

        *state = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        Ok(Role::Leader)
    }

    #[instrument(skip(self))]
    async fn run_refresh(&self) -> Result<SecretString, RefreshError> {
        let refresh_token = self
            .store
            .refresh_token()
            .map_err(|err| RefreshError::Store(err.to_string()))?;

        let Some(refresh_token) = refresh_token else {
            warn!("No refresh token stored, ending session");
            self.end_session(SessionEndReason::MissingRefreshToken);
            return Err(RefreshError::MissingRefreshToken);
        };

        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match self.refresher.refresh(&refresh_token).await {
            Ok(tokens) => {
                self.store
                    .update_tokens(tokens.access.clone(), tokens.refresh)
                    .map_err(|err| RefreshError::Store(err.to_string()))?;
                info!("Access token refreshed");
                let _ = self.events.send(AuthEvent::TokenRefreshed);
                Ok(tokens.access)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, ending session");
                self.end_session(SessionEndReason::RefreshFailed);
                Err(err)
            }
        }
    }

    fn end_session(&self, reason: SessionEndReason) {
        if let Err(err) = self.store.clear() {
            error!(error = %err, "Failed to clear session store");
        }
        let _ = self.events.send(AuthEvent::SessionEnded { reason });
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the coordinator to `Idle` if the leader is dropped mid-refresh.
///
/// Dropping the queued senders wakes every waiter with
/// [`RefreshError::Interrupted`] instead of leaving it pending forever.
struct LeaderGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl LeaderGuard<'_> {
    /// Finish normally, returning the queued waiters.
    fn release(mut self) -> Vec<Waiter> {
        self.armed = false;
        take_waiters(self.state)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let waiters = take_waiters(self.state);
            warn!(waiters = waiters.len(), "Token refresh abandoned");
        }
    }
}

fn take_waiters(state: &Mutex<RefreshState>) -> Vec<Waiter> {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    match std::mem::replace(&mut *state, RefreshState::Idle) {
        RefreshState::Refreshing { waiters } => waiters,
        RefreshState::Idle => Vec::new(),
    }
}

// =============================================================================
// HTTP refresher
// =============================================================================

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(alias = "access_token")]
    access: String,
    #[serde(default, alias = "refresh_token")]
    refresh: Option<String>,
}

/// Calls the storefront's refresh endpoint.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTokenRefresher {
    /// A refresher posting to `auth/refresh/` below `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL cannot be built.
    pub fn new(http: reqwest::Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            endpoint: base_url.join(REFRESH_PATH)?,
        })
    }
}

impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshedTokens, RefreshError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&RefreshRequest {
                refresh: refresh_token.expose_secret(),
            })
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = ErrorBody::read(response).await;
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: body.message_or(status.canonical_reason().unwrap_or("refresh rejected")),
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        Ok(RefreshedTokens {
            access: SecretString::from(body.access),
            refresh: body.refresh.map(SecretString::from),
        })
    }
}
