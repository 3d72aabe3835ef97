//! BankEase Core - Shared types library.
//!
//! This crate provides the types shared by every BankEase client component:
//! - `session` - Session store, Credential API client and token storage
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identity, plan tier, username, email and session token types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
