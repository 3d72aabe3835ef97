//! BankEase session client.
//!
//! Tracks who is signed in to the BankEase backend and keeps that answer
//! consistent across restarts, slow networks and overlapping requests.
//!
//! # Modules
//!
//! - [`api`] - Credential API trait and its HTTP implementation
//! - [`storage`] - Persistent Token Store implementations
//! - [`notify`] - User-facing notices
//! - [`forms`] - Sign-in and sign-up input validation
//! - [`config`] - Environment-driven configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use bankease_session::{
//!     HttpCredentialApi, SessionConfig, SessionStore, TracingNotifier,
//!     storage::FileTokenStore,
//! };
//!
//! let config = SessionConfig::from_env()?;
//! let api = HttpCredentialApi::from_config(&config)?;
//! let storage = FileTokenStore::in_dir(&state_dir);
//!
//! let session = SessionStore::builder(Arc::new(api), Arc::new(storage), Arc::new(TracingNotifier))
//!     .check_timeout(config.check_timeout)
//!     .build();
//!
//! session.check_auth().await;
//! if session.login("alice", "secret1").await {
//!     println!("{:?}", session.identity());
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod forms;
pub mod notify;
pub mod storage;
mod store;

pub use api::{ApiError, CredentialApi, HttpCredentialApi, LoginGrant};
pub use config::{ConfigError, SessionConfig};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{StorageError, TokenStore};
pub use store::{AuthState, SessionStatus, SessionStore, SessionStoreBuilder};
