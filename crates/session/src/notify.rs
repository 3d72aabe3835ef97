//! Notification sink for user-facing messages.
//!
//! The session store reports outcomes ("Welcome back, alice!") through a
//! [`Notifier`] handed to it at construction, never through a global.

use std::sync::{Mutex, PoisonError};

/// `tracing` target of every notice written by [`TracingNotifier`].
pub const NOTICE_TARGET: &str = "bankease::notice";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the `tracing` log.
///
/// Successes go out at `info`, errors at `warn`, under [`NOTICE_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(target: NOTICE_TARGET, "{}", notice.message),
            NoticeLevel::Error => tracing::warn!(target: NOTICE_TARGET, "{}", notice.message),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
