//! Dewdrop Core - Shared domain types.
//!
//! This crate provides the types shared by every Dewdrop component:
//! - `client` - Authenticated client for the storefront REST API
//! - `cli` - Command-line storefront built on the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. Everything here can be unit tested without
//! a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, cart totals and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
