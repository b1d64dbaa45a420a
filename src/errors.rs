//! # Marketplace Error Types Module
//!
//! Domain errors shared by the store, the access gate, the catalog and the
//! broker. None of them is fatal: the bot handlers turn every variant into
//! a chat reply.

use thiserror::Error;

/// Errors raised by marketplace operations
#[derive(Debug, Error)]
pub enum MarketError {
    /// A user with this Telegram identity is already registered
    #[error("User {0} is already registered")]
    DuplicateIdentity(i64),
    /// The public handle is held by another registered user
    #[error("Handle @{0} is already taken")]
    DuplicateHandle(String),
    /// Price is not a finite non-negative number
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    /// Referenced product or user does not exist
    #[error("{0} not found")]
    NotFound(String),
    /// Requesting user may not perform the action
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// A referenced file is missing on disk
    #[error("Resource missing: {0}")]
    ResourceMissing(String),
    /// Storage engine failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
