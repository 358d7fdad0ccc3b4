//! Relay error types

use cipherlink_core::Username;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;

/// Relay protocol errors
///
/// None of these are fatal: each is reported back to the originating caller
/// as an in-band event, never broadcast, and the connection stays up.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RelayError {
    /// The requested username already has a live session
    #[error("Username already taken")]
    UsernameTaken(Username),

    /// No live session exists for the username
    #[error("User {0} not found")]
    UserNotFound(Username),

    /// An identity-scoped action arrived on a connection with no bound
    /// username
    #[error("Connection has no bound identity")]
    NotRegistered,
}
