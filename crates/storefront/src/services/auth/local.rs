//! Local mock auth backed by the key-value store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use pocket_store_core::{Email, UserId};

use super::{AuthError, AuthService, load_session, persist_session, remove_session, validate_password};
use crate::models::{Session, User};
use crate::services::random_base36;
use crate::storage::{self, KeyValueStore, keys};

/// Name given to users who sign up without one.
const DEFAULT_USER_NAME: &str = "User";

/// Length of generated user ids.
const USER_ID_LENGTH: usize = 9;

/// One row of the users table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    /// Argon2id PHC string.
    password_hash: String,
    user: User,
}

/// Users keyed by normalized email.
type UsersTable = BTreeMap<String, UserRecord>;

/// Auth service storing users and sessions in a [`KeyValueStore`].
pub struct LocalAuthService {
    store: Arc<dyn KeyValueStore>,
    session_ttl: chrono::Duration,
}

impl LocalAuthService {
    /// Create a service issuing sessions that last `session_ttl`.
    ///
    /// TTLs beyond what chrono can represent saturate.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, session_ttl: Duration) -> Self {
        let session_ttl = chrono::Duration::from_std(session_ttl).unwrap_or(chrono::Duration::MAX);
        Self { store, session_ttl }
    }

    async fn load_users(&self) -> Result<UsersTable, AuthError> {
        Ok(storage::get_json(self.store.as_ref(), keys::USERS_TABLE)
            .await?
            .unwrap_or_default())
    }

    async fn save_users(&self, users: &UsersTable) -> Result<(), AuthError> {
        storage::set_json(self.store.as_ref(), keys::USERS_TABLE, users).await?;
        Ok(())
    }

    async fn start_session(&self, user: User) -> Result<Session, AuthError> {
        let session = Session::issue(user, self.session_ttl, Utc::now());
        persist_session(self.store.as_ref(), &session).await?;
        Ok(session)
    }
}

impl std::fmt::Debug for LocalAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAuthService")
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthService for LocalAuthService {
    #[instrument(skip(self, password))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let mut users = self.load_users().await?;
        let key = email.normalized();
        if users.contains_key(&key) {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let id = loop {
            let candidate = UserId::new(random_base36(USER_ID_LENGTH));
            if !users.values().any(|record| record.user.id == candidate) {
                break candidate;
            }
        };
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_USER_NAME)
            .to_owned();

        let user = User {
            id,
            email,
            name: Some(name),
        };
        users.insert(
            key,
            UserRecord {
                password_hash,
                user: user.clone(),
            },
        );
        self.save_users(&users).await?;

        info!(user_id = %user.id, "User registered");
        self.start_session(user).await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let record = self
            .load_users()
            .await?
            .remove(&email.normalized())
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &record.password_hash)?;

        info!(user_id = %record.user.id, "User signed in");
        self.start_session(record.user).await
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        remove_session(self.store.as_ref()).await
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        load_session(self.store.as_ref(), Utc::now()).await
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
