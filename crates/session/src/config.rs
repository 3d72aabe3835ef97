//! Session client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BANKEASE_API_URL` - Backend base URL (default: `http://localhost:8000`)
//! - `BANKEASE_AUTH_CHECK_TIMEOUT_MS` - How long startup token validation may
//!   take before the session is treated as signed out (default: 2000)
//! - `BANKEASE_HTTP_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)
//! - `BANKEASE_STATE_DIR` - Directory holding the session file (default: the
//!   platform data directory; when none can be determined the client runs
//!   without durable storage)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend address (the development API server).
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default time allowed for validating a stored token at startup.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Session client configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL
    pub api_url: Url,
    /// Upper bound on startup token validation
    pub check_timeout: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Where the session file lives; `None` means no durable storage
    pub state_dir: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl SessionConfig {
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

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(
            lookup("BANKEASE_API_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_URL),
        )?;

        let check_timeout = lookup("BANKEASE_AUTH_CHECK_TIMEOUT_MS")
            .map(|raw| parse_u64("BANKEASE_AUTH_CHECK_TIMEOUT_MS", &raw))
            .transpose()?
            .map_or(DEFAULT_CHECK_TIMEOUT, Duration::from_millis);

        let http_timeout = lookup("BANKEASE_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_u64("BANKEASE_HTTP_TIMEOUT_SECS", &raw))
            .transpose()?
            .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs);

        let state_dir = lookup("BANKEASE_STATE_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(default_state_dir);

        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty());

        Ok(Self {
            api_url,
            check_timeout,
            http_timeout,
            state_dir,
            sentry_dsn,
        })
    }
}

/// Parse a backend base URL, accepting only http and https.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unparseable URLs or other schemes.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("BANKEASE_API_URL".to_string(), e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "BANKEASE_API_URL".to_string(),
            format!("unsupported scheme {other}"),
        )),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn default_state_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "BankEase", "bankease")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.check_timeout, Duration::from_millis(2000));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("BANKEASE_API_URL", "https://api.bankease.example"),
            ("BANKEASE_AUTH_CHECK_TIMEOUT_MS", "500"),
            ("BANKEASE_HTTP_TIMEOUT_SECS", " 5 "),
            ("BANKEASE_STATE_DIR", "/tmp/bankease-test"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.host_str(), Some("api.bankease.example"));
        assert_eq!(config.check_timeout, Duration::from_millis(500));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.state_dir, Some(PathBuf::from("/tmp/bankease-test")));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = SessionConfig::from_lookup(lookup_from(&[(
            "BANKEASE_AUTH_CHECK_TIMEOUT_MS",
            "soon",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("BANKEASE_AUTH_CHECK_TIMEOUT_MS"));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(parse_api_url("ftp://bankease.example").is_err());
        assert!(parse_api_url("not a url").is_err());
        assert!(parse_api_url("https://bankease.example").is_ok());
    }
}
