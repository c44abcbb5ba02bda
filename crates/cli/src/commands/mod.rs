//! Command implementations.

pub mod account;
pub mod admin;
pub mod shop;
pub mod social;

use thiserror::Error;

/// Errors raised by the CLI itself, as opposed to the API client.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Reading a password or file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command-line value was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The command needs a signed-in session.
    #[error("Not signed in. Run `dewdrop login` first.")]
    NotSignedIn,

    /// Checkout stopped on an allergen match.
    #[error("Order not placed: products match your declared allergies (re-run with --accept-allergens to order anyway)")]
    AllergensFound,
}
