//! Credential API error types.

use thiserror::Error;

/// Errors that can occur when calling the Credential API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend refused the request and said why.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The token was missing, expired or revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// The call succeeded but carried no usable payload.
    #[error("response carried no payload")]
    MissingPayload,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Unexpected status code with no readable reason.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Endpoint URL could not be built from the base URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The server-provided reason, if this error carries one.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Whether the backend answered and said no, as opposed to the call
    /// itself going wrong.
    #[must_use]
    pub const fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_) | Self::Unauthorized | Self::MissingPayload
        )
    }
}
