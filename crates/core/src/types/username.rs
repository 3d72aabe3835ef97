//! Account username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is empty or only whitespace.
    #[error("username cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Unique account name.
///
/// Always non-empty. Stricter sign-up rules (minimum length) live in the
/// form validation layer, not here, so that any name the backend returns
/// can be represented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Maximum length accepted from any source.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or longer than
    /// [`Username::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.trim().is_empty() {
            return Err(UsernameError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert!(Username::parse("alice").is_ok());
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
        assert_eq!(Username::parse("   "), Err(UsernameError::Empty));
        assert!(matches!(
            Username::parse(&"x".repeat(65)),
            Err(UsernameError::TooLong { max: 64 })
        ));
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
        assert!(serde_json::from_str::<Username>("\"bob\"").is_ok());
    }
}
