//! Authentication service.
//!
//! Two interchangeable backends sit behind [`AuthService`]:
//!
//! - [`LocalAuthService`] - users and sessions live in the key-value store.
//!   This is the system of record.
//! - [`HostedAuthService`] - a GoTrue-compatible REST backend.
//!
//! Both persist the active [`Session`] under the `auth-session` key, so
//! session restore behaves the same whichever backend issued it.

mod error;
mod hosted;
mod local;

pub use error::AuthError;
pub use hosted::HostedAuthService;
pub use local::LocalAuthService;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::models::Session;
use crate::storage::{self, KeyValueStore, keys};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// User authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and start a session for them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is registered,
    /// `AuthError::InvalidEmail` or `AuthError::WeakPassword` on bad input.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Session, AuthError>;

    /// Start a fresh session for an existing user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on unknown email or wrong
    /// password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// End the current session. Succeeds when no session exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the session cannot be removed.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The persisted session, if present and unexpired.
    ///
    /// An expired session is removed and `None` returned.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;
}

/// Shared handle to an auth backend.
pub type SharedAuthService = Arc<dyn AuthService>;

// =============================================================================
// Session persistence
// =============================================================================

/// Load the persisted session, removing it if it expired before `now`.
///
/// A session that no longer decodes is treated like an expired one.
#[instrument(skip(store))]
pub(crate) async fn load_session(
    store: &dyn KeyValueStore,
    now: DateTime<Utc>,
) -> Result<Option<Session>, AuthError> {
    let session = match storage::get_json::<Session>(store, keys::AUTH_SESSION).await {
        Ok(session) => session,
        Err(storage::StorageError::DataCorruption(e)) => {
            tracing::warn!(error = %e, "Discarding unreadable session");
            store.remove(keys::AUTH_SESSION).await?;
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    match session {
        Some(session) if session.is_expired_at(now) => {
            debug!(user_id = %session.user.id, "Session expired");
            store.remove(keys::AUTH_SESSION).await?;
            Ok(None)
        }
        other => Ok(other),
    }
}

pub(crate) async fn persist_session(
    store: &dyn KeyValueStore,
    session: &Session,
) -> Result<(), AuthError> {
    storage::set_json(store, keys::AUTH_SESSION, session).await?;
    Ok(())
}

pub(crate) async fn remove_session(store: &dyn KeyValueStore) -> Result<(), AuthError> {
    store.remove(keys::AUTH_SESSION).await?;
    Ok(())
}

// =============================================================================
// Password helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
