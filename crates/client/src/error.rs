//! Unified error handling for storefront API calls.
//!
//! Every client method returns [`Result<T>`]. The backend reports failures
//! as a JSON body carrying an `error`, `detail` or `message` string, or a map
//! of field names to lists of messages; [`ErrorBody`] flattens all of those
//! into one readable message.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::refresh::RefreshError;
use crate::session::SessionStoreError;

/// Errors returned by the storefront client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered with an error status.
    #[error("Request failed ({status}): {message}")]
    Status {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Flattened error message.
        message: String,
    },

    /// The backend rejected our credentials and refreshing cannot help.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The signed-in user may not perform this action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An authenticated endpoint was called without a session.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The access token expired and could not be renewed.
    #[error("Session refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Reading or writing the local session failed.
    #[error("Session store error: {0}")]
    Store(#[from] SessionStoreError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend rejected the submitted data.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Input rejected before anything was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// True if the failure ended the local session.
    #[must_use]
    pub const fn ended_session(&self) -> bool {
        matches!(
            self,
            Self::Refresh(RefreshError::MissingRefreshToken | RefreshError::Rejected { .. })
        )
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Substrings that mark a 401 as an expired or invalid access token.
const TOKEN_REJECTION_MARKERS: &[&str] = &["expired", "invalid token"];

/// Structured `code` some backends attach to token rejections.
const TOKEN_REJECTION_CODE: &str = "token_not_valid";

/// An error response body from the storefront API.
#[derive(Debug, Clone, Default)]
pub struct ErrorBody(Value);

impl ErrorBody {
    /// Wrap an already parsed body.
    #[must_use]
    pub const fn new(body: Value) -> Self {
        Self(body)
    }

    /// Read a response body, tolerating empty or non-JSON payloads.
    pub async fn read(response: reqwest::Response) -> Self {
        let bytes = response.bytes().await.unwrap_or_default();
        if bytes.is_empty() {
            return Self::default();
        }
        Self(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).trim().to_string())
        }))
    }

    /// The flattened, human-readable message, if the body carries one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.0 {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => {
                for key in ["error", "detail", "message"] {
                    if let Some(Value::String(s)) = map.get(key) {
                        return Some(s.clone());
                    }
                }
                let fields: Vec<String> = map
                    .iter()
                    .filter_map(|(field, value)| {
                        let text = flatten_messages(value)?;
                        Some(if field == "non_field_errors" {
                            text
                        } else {
                            format!("{field}: {text}")
                        })
                    })
                    .collect();
                (!fields.is_empty()).then(|| fields.join("; "))
            }
            Value::Array(_) => flatten_messages(&self.0),
            _ => None,
        }
    }

    /// The message, or `fallback` when the body carries none.
    #[must_use]
    pub fn message_or(&self, fallback: impl Into<String>) -> String {
        self.message().unwrap_or_else(|| fallback.into())
    }

    /// Whether a 401 with this body means the access token expired or is
    /// no longer valid (as opposed to, say, wrong login credentials).
    #[must_use]
    pub fn is_token_rejection(&self) -> bool {
        if self.0.get("code").and_then(Value::as_str) == Some(TOKEN_REJECTION_CODE) {
            return true;
        }
        self.message().is_some_and(|message| {
            let message = message.to_lowercase();
            TOKEN_REJECTION_MARKERS
                .iter()
                .any(|marker| message.contains(marker))
        })
    }
}

fn flatten_messages(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_messages).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("detail"))
            .and_then(flatten_messages),
        _ => None,
    }
}
