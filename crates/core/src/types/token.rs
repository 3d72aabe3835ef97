//! Session token type.

use secrecy::{ExposeSecret, SecretString};

/// Opaque bearer credential issued by the backend at login.
///
/// The value never appears in `Debug` output or logs; call
/// [`SessionToken::expose`] at the point where it is sent or persisted.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Returns the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the token is empty (the backend never issues one).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SessionToken {}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}
