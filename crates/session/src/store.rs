//! Session store: the single source of truth for who is signed in.
//!
//! # Lifecycle
//!
//! ```text
//!            check_auth
//!   Unknown ───────────┬──────────────► Authenticated ◄──┐ login
//!                      │                    │     ▲      │ (switch account)
//!                      ▼          logout /  │     │      │
//!               Unauthenticated ◄───────────┘     └──────┘
//!                      │      failed re-validation
//!                      └──────────────────────────► Authenticated (login)
//! ```
//!
//! # Ordering
//!
//! `login` and `logout` each open a new epoch when they start; a result from
//! an older epoch is dropped, so a slow login that resolves after a logout
//! does not sign the user back in. `check_auth` joins the current epoch
//! without opening one and only ever loses: a newer check, or a login or
//! logout that starts or publishes while it runs, makes its result stale.
//! `register` never touches the identity and takes no ticket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use bankease_core::{Identity, SessionToken};

use crate::api::{ApiError, CredentialApi};
use crate::config::DEFAULT_CHECK_TIMEOUT;
use crate::notify::{Notice, Notifier};
use crate::storage::{TokenStore, keys};

const LOGIN_FAILED: &str = "Login failed";
const LOGIN_ERROR: &str = "Something went wrong while signing in";
const REGISTER_OK: &str = "Registration successful!";
const REGISTER_FAILED: &str = "Registration failed";
const REGISTER_ERROR: &str = "Something went wrong while registering";
const LOGOUT_OK: &str = "Signed out successfully";

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// Startup check has not finished yet.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthState {
    identity: Option<Identity>,
    status: SessionStatus,
    in_flight: usize,
    finished_any: bool,
}

impl AuthState {
    /// The signed-in account, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// True before the first operation finishes and while any operation runs.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
            || (matches!(self.status, SessionStatus::Unknown) && !self.finished_any)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Holds the current identity and keeps it in sync with the token store and
/// the backend.
///
/// Cheap to clone; clones share the same state. Build one per application
/// and hand it to every consumer.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    api: Arc<dyn CredentialApi>,
    storage: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<AuthState>,
    epoch: AtomicU64,
    checks: AtomicU64,
    check_timeout: Duration,
    background: Mutex<Vec<JoinHandle<()>>>,
}

/// Builder for [`SessionStore`].
pub struct SessionStoreBuilder {
    api: Arc<dyn CredentialApi>,
    storage: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    check_timeout: Duration,
}

impl SessionStoreBuilder {
    /// How long `check_auth` waits for the backend before giving up on the
    /// stored token.
    #[must_use]
    pub fn check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> SessionStore {
        let (state, _) = watch::channel(AuthState::default());

        SessionStore {
            inner: Arc::new(SessionStoreInner {
                api: self.api,
                storage: self.storage,
                notifier: self.notifier,
                state,
                epoch: AtomicU64::new(0),
                checks: AtomicU64::new(0),
                check_timeout: self.check_timeout,
                background: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl SessionStore {
    /// Create a store with the default check timeout.
    #[must_use]
    pub fn new(
        api: Arc<dyn CredentialApi>,
        storage: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::builder(api, storage, notifier).build()
    }

    #[must_use]
    pub fn builder(
        api: Arc<dyn CredentialApi>,
        storage: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> SessionStoreBuilder {
        SessionStoreBuilder {
            api,
            storage,
            notifier,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    /// Wait until no operation is running and at least one has finished.
    pub async fn wait_until_settled(&self) -> AuthState {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Start [`SessionStore::check_auth`] on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn_check(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move { store.check_auth().await })
    }

    /// Resolve the stored session, if any, into an identity.
    ///
    /// Order of precedence: no durable storage → signed out; a demo identity
    /// record → that identity; no token → signed out; otherwise the backend
    /// decides, within the check timeout. A token the backend refuses (or
    /// does not answer for in time) is deleted.
    pub async fn check_auth(&self) {
        let _busy = Busy::enter(&self.inner.state);
        let ticket = self.begin_check();

        if !self.inner.storage.is_available() {
            tracing::debug!("No durable storage; treating session as signed out");
            self.settle(ticket, None);
            return;
        }

        if let Some(identity) = self.demo_identity() {
            tracing::info!(username = %identity.username, "Restored demo session");
            self.settle(ticket, Some(identity));
            return;
        }

        let Some(token) = self.stored_token() else {
            tracing::debug!("No stored token");
            self.settle(ticket, None);
            return;
        };

        let lookup = self.inner.api.fetch_identity(&token);
        match tokio::time::timeout(self.inner.check_timeout, lookup).await {
            Ok(Ok(identity)) => {
                tracing::info!(username = %identity.username, "Stored session is valid");
                self.settle(ticket, Some(identity));
            }
            Ok(Err(e)) => {
                if e.is_refusal() {
                    tracing::info!(reason = %e, "Stored session was rejected");
                } else {
                    tracing::warn!(error = %e, "Stored session could not be checked");
                }
                self.discard_token(ticket, &token);
                self.settle(ticket, None);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = u64::try_from(self.inner.check_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    "Session check timed out"
                );
                self.discard_token(ticket, &token);
                self.settle(ticket, None);
            }
        }
    }

    /// Sign in. Returns whether the account is now signed in.
    ///
    /// Any previous identity is replaced on success and cleared on failure.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let _busy = Busy::enter(&self.inner.state);
        let ticket = self.begin_intent();

        let grant = match self.inner.api.authenticate(username, password).await {
            Ok(grant) => grant,
            Err(e) => {
                if e.is_refusal() {
                    tracing::info!(username, reason = %e, "Login refused");
                } else {
                    tracing::warn!(username, error = %e, "Login failed");
                }
                self.settle(ticket, None);
                self.notify(Notice::error(failure_message(&e, LOGIN_FAILED, LOGIN_ERROR)));
                return false;
            }
        };

        if !self.is_current(ticket) {
            tracing::debug!(username, "Login superseded; revoking its token");
            self.revoke_in_background(grant.token);
            return false;
        }

        if let Err(e) = self
            .inner
            .storage
            .set(keys::ACCESS_TOKEN, grant.token.expose())
        {
            tracing::error!(error = %e, "Failed to persist session token");
            self.revoke_in_background(grant.token);
            self.settle(ticket, None);
            self.notify(Notice::error(LOGIN_ERROR));
            return false;
        }

        // A real account replaces any offline demo session.
        if let Err(e) = self.inner.storage.remove(keys::DEMO_IDENTITY) {
            tracing::warn!(error = %e, "Failed to clear demo identity");
        }

        let welcome = format!("Welcome back, {}!", grant.identity.username);
        if !self.settle(ticket, Some(grant.identity)) {
            // A logout landed between persisting and publishing.
            self.remove_token_if(&grant.token);
            self.revoke_in_background(grant.token);
            return false;
        }

        tracing::info!(username, "Signed in");
        self.notify(Notice::success(welcome));
        true
    }

    /// Create an account. Returns whether the backend accepted it.
    ///
    /// Does not sign in; callers that want that follow up with
    /// [`SessionStore::login`].
    pub async fn register(&self, username: &str, email: &str, password: &str) -> bool {
        let _busy = Busy::enter(&self.inner.state);

        match self
            .inner
            .api
            .create_account(username, email, password)
            .await
        {
            Ok(()) => {
                tracing::info!(username, "Account registered");
                self.notify(Notice::success(REGISTER_OK));
                true
            }
            Err(e) => {
                if e.is_refusal() {
                    tracing::info!(username, reason = %e, "Registration refused");
                } else {
                    tracing::warn!(username, error = %e, "Registration failed");
                }
                self.notify(Notice::error(failure_message(
                    &e,
                    REGISTER_FAILED,
                    REGISTER_ERROR,
                )));
                false
            }
        }
    }

    /// Sign out immediately.
    ///
    /// Local credentials are deleted before this returns; the backend is told
    /// in the background. Safe to call when already signed out.
    pub fn logout(&self) {
        let ticket = self.begin_intent();
        let token = self.stored_token();

        for key in [keys::ACCESS_TOKEN, keys::DEMO_IDENTITY] {
            if let Err(e) = self.inner.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear stored session");
            }
        }

        if let Some(token) = token {
            self.revoke_in_background(token);
        }

        self.settle(ticket, None);
        tracing::info!("Signed out");
        self.notify(Notice::success(LOGOUT_OK));
    }

    /// Wait for background token invalidations started by `logout` to finish.
    ///
    /// Short-lived processes call this before exiting so the backend hears
    /// about the sign-out.
    pub async fn drain_background(&self) {
        let tasks = {
            let mut background = self
                .inner
                .background
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *background)
        };

        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background session task failed");
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Open a new epoch for a login or logout.
    fn begin_intent(&self) -> Ticket {
        Ticket {
            epoch: self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1,
            check: None,
        }
    }

    /// Join the current epoch as the newest check.
    fn begin_check(&self) -> Ticket {
        Ticket {
            epoch: self.inner.epoch.load(Ordering::SeqCst),
            check: Some(self.inner.checks.fetch_add(1, Ordering::SeqCst) + 1),
        }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.inner.epoch.load(Ordering::SeqCst) == ticket.epoch
            && ticket
                .check
                .is_none_or(|check| self.inner.checks.load(Ordering::SeqCst) == check)
    }

    /// Publish a result if `ticket` has not been superseded.
    ///
    /// A login or logout that publishes also retires every check still in
    /// flight, since those read storage from before it.
    fn settle(&self, ticket: Ticket, identity: Option<Identity>) -> bool {
        let mut applied = false;

        self.inner.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            if ticket.check.is_none() {
                self.inner.checks.fetch_add(1, Ordering::SeqCst);
            }
            state.status = if identity.is_some() {
                SessionStatus::Authenticated
            } else {
                SessionStatus::Unauthenticated
            };
            state.identity = identity;
            applied = true;
            true
        });

        if !applied {
            tracing::debug!(?ticket, "Discarding superseded session result");
        }
        applied
    }

    fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    fn stored_token(&self) -> Option<SessionToken> {
        match self.inner.storage.get(keys::ACCESS_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SessionToken::new),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// Read the demo identity record, discarding it if it is unreadable.
    fn demo_identity(&self) -> Option<Identity> {
        let raw = match self.inner.storage.get(keys::DEMO_IDENTITY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read demo identity");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt demo identity");
                if let Err(e) = self.inner.storage.remove(keys::DEMO_IDENTITY) {
                    tracing::warn!(error = %e, "Failed to remove demo identity");
                }
                None
            }
        }
    }

    /// Delete the stored token after a failed check, unless a newer
    /// operation has taken over.
    fn discard_token(&self, ticket: Ticket, token: &SessionToken) {
        if self.is_current(ticket) {
            self.remove_token_if(token);
        }
    }

    /// Delete the stored token only if it is still `token`.
    fn remove_token_if(&self, token: &SessionToken) {
        if self.stored_token().as_ref() != Some(token) {
            return;
        }
        if let Err(e) = self.inner.storage.remove(keys::ACCESS_TOKEN) {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
    }

    fn revoke_in_background(&self, token: SessionToken) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime; skipping remote session invalidation");
            return;
        };

        let api = Arc::clone(&self.inner.api);
        let task = runtime.spawn(async move {
            if let Err(e) = api.invalidate(&token).await {
                tracing::debug!(error = %e, "Remote session invalidation failed");
            }
        });

        let mut background = self
            .inner
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        background.retain(|task| !task.is_finished());
        background.push(task);
    }
}

/// Position of an operation in the store's ordering.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    epoch: u64,
    /// Set for `check_auth`; login and logout carry `None`.
    check: Option<u64>,
}

/// Marks an operation as in flight for as long as it lives.
struct Busy<'a> {
    state: &'a watch::Sender<AuthState>,
}

impl<'a> Busy<'a> {
    fn enter(state: &'a watch::Sender<AuthState>) -> Self {
        state.send_modify(|s| s.in_flight += 1);
        Self { state }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.finished_any = true;
        });
    }
}

/// User-facing text for a failed call: the backend's own reason when it gave
/// one, otherwise a fixed message that hides transport details.
fn failure_message(error: &ApiError, refused: &str, broken: &str) -> String {
    match error.reason() {
        Some(reason) => reason.to_owned(),
        None if error.is_refusal() => refused.to_owned(),
        None => broken.to_owned(),
    }
}
