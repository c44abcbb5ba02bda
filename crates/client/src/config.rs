//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `DEWDROP_API_BASE_URL` - Storefront API root (default: `http://localhost:8000/api`)
//! - `DEWDROP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `DEWDROP_SESSION_FILE` - Where the persisted session lives
//!   (default: `~/.dewdrop/session.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default API root when `DEWDROP_API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; always ends with `/` so relative endpoint paths join below it
    pub base_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Session file used by the file-backed session store
    pub session_file: PathBuf,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl ClientConfig {
    /// Build a configuration for the given API root with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("DEWDROP_API_BASE_URL", base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: default_session_file(std::env::var("HOME").ok()),
            user_agent: default_user_agent(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "DEWDROP_API_BASE_URL",
            &lookup("DEWDROP_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let timeout_secs = match lookup("DEWDROP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "DEWDROP_TIMEOUT_SECS".to_string(),
                        format!("expected a positive number of seconds, got {raw:?}"),
                    )
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let session_file = lookup("DEWDROP_SESSION_FILE")
            .filter(|path| !path.trim().is_empty())
            .map_or_else(|| default_session_file(lookup("HOME")), PathBuf::from);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            session_file,
            user_agent: default_user_agent(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an API root and make sure it ends with a slash.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(|| PathBuf::from(".dewdrop"), |home| PathBuf::from(home).join(".dewdrop"))
        .join("session.json")
}

fn default_user_agent() -> String {
    format!("dewdrop-client/{}", env!("CARGO_PKG_VERSION"))
}
