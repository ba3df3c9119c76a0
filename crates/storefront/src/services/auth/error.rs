//! Authentication error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] pocket_store_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Reading or writing users or the session failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The hosted backend rejected the request.
    #[error("auth backend returned HTTP {status}: {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Backend's error message.
        message: String,
    },

    /// The hosted backend could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
