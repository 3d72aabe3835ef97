//! Token storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the token store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No durable storage exists in this context.
    #[error("no durable storage available")]
    Unavailable,

    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Stored data is not a valid store document.
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}
