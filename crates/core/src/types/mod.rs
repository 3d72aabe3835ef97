//! Core types for BankEase.
//!
//! This module provides type-safe wrappers for account and session concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod plan;
pub mod token;
pub mod username;

pub use email::{Email, EmailError};
pub use id::UserId;
pub use identity::Identity;
pub use plan::PlanTier;
pub use token::SessionToken;
pub use username::{Username, UsernameError};
