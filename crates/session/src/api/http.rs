//! HTTP implementation of the Credential API.
//!
//! Talks to the BankEase REST backend:
//!
//! - `POST /api/auth/login` (OAuth2 password form) → `{ access_token, user? }`
//! - `POST /api/auth/register` (JSON) → `{ success, message, error? }`
//! - `GET /api/auth/me` (bearer) → profile
//! - `POST /api/auth/logout` (bearer)
//! - `GET /health`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use bankease_core::{Identity, SessionToken};

use super::{ApiError, CredentialApi, LoginGrant};
use crate::config::SessionConfig;

const LOGIN_PATH: &str = "api/auth/login";
const REGISTER_PATH: &str = "api/auth/register";
const ME_PATH: &str = "api/auth/me";
const LOGOUT_PATH: &str = "api/auth/logout";
const HEALTH_PATH: &str = "health";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<Identity>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Credential API client for the BankEase backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpCredentialApi {
    inner: Arc<HttpCredentialApiInner>,
}

struct HttpCredentialApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCredentialApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("bankease-session/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCredentialApiInner {
                client,
                base_url: with_trailing_slash(base_url),
            }),
        })
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &SessionConfig) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Check that the backend is reachable and healthy.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the backend is unreachable, or
    /// `ApiError::Status` if it answers with a non-success status.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(HEALTH_PATH)?)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn me(&self, token: &SessionToken) -> Result<Identity, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(ME_PATH)?)
            .bearer_auth(token.expose())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        decode(response).await
    }
}

#[async_trait]
impl CredentialApi for HttpCredentialApi {
    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        tracing::debug!(username, "Requesting access token");

        let params = [("username", username), ("password", password)];
        let response = self
            .inner
            .client
            .post(self.endpoint(LOGIN_PATH)?)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: TokenResponse = decode(response).await?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .map(SessionToken::new)
            .ok_or(ApiError::MissingPayload)?;

        // Older backends return only the token; the profile is one call away.
        let identity = match body.user {
            Some(identity) => identity,
            None => self.me(&token).await?,
        };

        Ok(LoginGrant { identity, token })
    }

    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        tracing::debug!(username, "Registering account");

        let response = self
            .inner
            .client
            .post(self.endpoint(REGISTER_PATH)?)
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let envelope: Envelope = decode(response).await?;
        if envelope.success {
            return Ok(());
        }

        match envelope.error.or(envelope.message) {
            Some(reason) if !reason.is_empty() => Err(ApiError::Rejected(reason)),
            _ => Err(ApiError::MissingPayload),
        }
    }

    async fn fetch_identity(&self, token: &SessionToken) -> Result<Identity, ApiError> {
        self.me(token).await
    }

    async fn invalidate(&self, token: &SessionToken) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(LOGOUT_PATH)?)
            .bearer_auth(token.expose())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Turn a non-success response into the most specific error available.
async fn rejection(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Some(reason) = reason_from_body(&body) {
        return ApiError::Rejected(reason);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        ApiError::Unauthorized
    } else {
        ApiError::Status(status.as_u16())
    }
}

/// Extract a human-readable reason from an error body.
///
/// Handles `{"detail": "..."}`, FastAPI validation errors
/// (`{"detail": [{"msg": "..."}]}`) and `{"error": "..."}`.
fn reason_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let reason = match value.get("detail") {
        Some(serde_json::Value::String(detail)) => Some(detail.as_str()),
        Some(serde_json::Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(serde_json::Value::as_str),
        _ => value.get("error").and_then(serde_json::Value::as_str),
    };

    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
}
