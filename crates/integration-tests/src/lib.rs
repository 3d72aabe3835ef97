//! Integration tests for the BankEase session client.
//!
//! Every test runs against a `wiremock` server standing in for the BankEase
//! backend, so no external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bankease-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `http_api` - wire format of the HTTP Credential API client
//! - `session_flow` - session store over HTTP and a session file, across restarts

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

use bankease_session::storage::FileTokenStore;
use bankease_session::{HttpCredentialApi, RecordingNotifier, SessionStore};

/// HTTP client pointed at a mock backend.
///
/// # Panics
///
/// Panics if the mock server URI is not a valid URL.
#[must_use]
pub fn api_for(server: &MockServer) -> HttpCredentialApi {
    let base = Url::parse(&server.uri()).expect("mock server URI is a URL");
    HttpCredentialApi::new(base, Duration::from_secs(5)).expect("Failed to create HTTP client")
}

/// Backend profile payload for `username`.
#[must_use]
pub fn profile(username: &str) -> Value {
    json!({
        "id": 7,
        "username": username,
        "email": format!("{username}@example.com"),
        "plan": "pro",
        "created_at": "2025-01-15T09:30:00",
        "is_active": true
    })
}

/// A session store as an application would build it, with its session file
/// in `state_dir`.
pub struct TestSession {
    pub store: SessionStore,
    pub notices: Arc<RecordingNotifier>,
    pub storage: Arc<FileTokenStore>,
}

impl TestSession {
    /// Build a store against `server`, reading and writing `state_dir`.
    #[must_use]
    pub fn open(server: &MockServer, state_dir: &Path) -> Self {
        let notices = Arc::new(RecordingNotifier::new());
        let storage = Arc::new(FileTokenStore::in_dir(state_dir));
        let store = SessionStore::builder(
            Arc::new(api_for(server)),
            storage.clone(),
            notices.clone(),
        )
        .check_timeout(Duration::from_millis(500))
        .build();

        Self {
            store,
            notices,
            storage,
        }
    }
}
