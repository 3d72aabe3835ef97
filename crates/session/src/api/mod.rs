//! Credential API: the remote side of the session lifecycle.
//!
//! # Operations
//!
//! | Call | Ok | Notes |
//! |---|---|---|
//! | [`CredentialApi::authenticate`] | [`LoginGrant`] | issues a token |
//! | [`CredentialApi::create_account`] | `()` | does not sign in |
//! | [`CredentialApi::fetch_identity`] | [`Identity`] | validates a stored token |
//! | [`CredentialApi::invalidate`] | `()` | best-effort |
//!
//! [`HttpCredentialApi`] talks to the BankEase REST backend. Tests and
//! embedders can supply their own implementation.

mod error;
mod http;

pub use error::ApiError;
pub use http::HttpCredentialApi;

use async_trait::async_trait;

use bankease_core::{Identity, SessionToken};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// Profile of the account that signed in.
    pub identity: Identity,
    /// Bearer token for subsequent calls.
    pub token: SessionToken,
}

/// Remote account operations used by the session store.
#[async_trait]
pub trait CredentialApi: Send + Sync {
    /// Exchange a username and password for an identity and a token.
    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError>;

    /// Create a new account.
    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError>;

    /// Resolve a token to the identity it belongs to.
    async fn fetch_identity(&self, token: &SessionToken) -> Result<Identity, ApiError>;

    /// Ask the backend to invalidate a token.
    async fn invalidate(&self, token: &SessionToken) -> Result<(), ApiError>;
}
