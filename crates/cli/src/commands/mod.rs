//! Command implementations.

pub mod auth;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use bankease_session::forms::FormErrors;
use bankease_session::storage::{FileTokenStore, HeadlessTokenStore, TokenStore};
use bankease_session::{ApiError, HttpCredentialApi, SessionConfig, SessionStore, TracingNotifier};

/// Errors that end a command with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Input rejected before reaching the backend.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] FormErrors),

    /// The backend refused the sign-in (the reason has already been shown).
    #[error("Not signed in")]
    LoginFailed,

    /// The backend refused the new account (the reason has already been shown).
    #[error("Account not created")]
    RegistrationFailed,

    /// Backend call outside the session store.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
}

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub session: SessionStore,
    pub api: HttpCredentialApi,
    /// Session file location; `None` when running without durable storage.
    pub storage_path: Option<PathBuf>,
}

impl Context {
    /// Wire the session store to the configured backend and state directory.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn new(config: &SessionConfig) -> Result<Self, ApiError> {
        let api = HttpCredentialApi::from_config(config)?;

        let (storage, storage_path): (Arc<dyn TokenStore>, _) = match &config.state_dir {
            Some(dir) => {
                let store = FileTokenStore::in_dir(dir);
                let path = store.path().to_path_buf();
                (Arc::new(store), Some(path))
            }
            None => {
                tracing::warn!("No state directory available; the session will not be kept");
                (Arc::new(HeadlessTokenStore), None)
            }
        };

        let session = SessionStore::builder(Arc::new(api.clone()), storage, Arc::new(TracingNotifier))
            .check_timeout(config.check_timeout)
            .build();

        tracing::debug!(api_url = %api.base_url(), "Session context ready");

        Ok(Self {
            session,
            api,
            storage_path,
        })
    }
}
