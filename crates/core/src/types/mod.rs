//! Core types for Dewdrop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use cart::{CartTotals, PricedLine, TAX_RATE_PERCENT};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Money, MoneyError};
pub use status::*;
