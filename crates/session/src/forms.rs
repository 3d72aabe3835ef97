//! Sign-in and sign-up input validation.
//!
//! Runs before anything reaches the session store; the store itself does not
//! re-check its arguments. Every failing field is reported, not just the
//! first one.

use std::fmt;

use thiserror::Error;

use bankease_core::{Email, EmailError};

/// Minimum username length accepted by the sign-up form.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Form field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("username is required")]
    UsernameRequired,

    #[error("username must be at least 3 characters")]
    UsernameTooShort,

    #[error("email is required")]
    EmailRequired,

    #[error("email is invalid: {0}")]
    EmailInvalid(EmailError),

    #[error("password is required")]
    PasswordRequired,

    #[error("password must be at least 6 characters")]
    PasswordTooShort,

    #[error("passwords do not match")]
    PasswordMismatch,
}

impl FormError {
    /// The field this error should be shown next to.
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::UsernameRequired | Self::UsernameTooShort => Field::Username,
            Self::EmailRequired | Self::EmailInvalid(_) => Field::Email,
            Self::PasswordRequired | Self::PasswordTooShort => Field::Password,
            Self::PasswordMismatch => Field::ConfirmPassword,
        }
    }
}

/// All validation failures of one form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors(Vec<FormError>);

impl FormErrors {
    /// Individual failures, in field order.
    #[must_use]
    pub fn errors(&self) -> &[FormError] {
        &self.0
    }

    /// The failure for a given field, if any.
    #[must_use]
    pub fn for_field(&self, field: Field) -> Option<&FormError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Sign-in form input.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Check the form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();
        check_username(&self.username, &mut errors);
        check_password(&self.password, &mut errors);
        finish(errors)
    }
}

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();
        check_username(&self.username, &mut errors);

        if self.email.is_empty() {
            errors.push(FormError::EmailRequired);
        } else if let Err(e) = Email::parse(&self.email) {
            errors.push(FormError::EmailInvalid(e));
        }

        check_password(&self.password, &mut errors);

        if self.password != self.confirm_password {
            errors.push(FormError::PasswordMismatch);
        }

        finish(errors)
    }
}

fn check_username(username: &str, errors: &mut Vec<FormError>) {
    if username.is_empty() {
        errors.push(FormError::UsernameRequired);
    } else if username.chars().count() < MIN_USERNAME_LENGTH {
        errors.push(FormError::UsernameTooShort);
    }
}

fn check_password(password: &str, errors: &mut Vec<FormError>) {
    if password.is_empty() {
        errors.push(FormError::PasswordRequired);
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FormError::PasswordTooShort);
    }
}

fn finish(errors: Vec<FormError>) -> Result<(), FormErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(FormErrors(errors))
    }
}
