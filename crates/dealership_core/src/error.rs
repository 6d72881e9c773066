//! crates/dealership_core/src/error.rs
//!
//! Domain-level outcomes that callers map onto responses.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing, malformed, expired or revoked token. The cause is never exposed.
    #[error("Invalid session token, or expired session")]
    InvalidSession,

    #[error("Forbidden, access denied.")]
    Forbidden,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The token was signed but the cache refused the entry.
    #[error("Failed to establish session")]
    SessionNotEstablished,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidPagination(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

pub type CoreResult<T> = Result<T, CoreError>;
