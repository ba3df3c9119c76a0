//! Authenticated session types.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::user::User;

/// Length of locally issued session tokens.
const TOKEN_LENGTH: usize = 32;

/// Generate a random alphanumeric session token.
#[must_use]
pub fn generate_token() -> SecretString {
    let token: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    SecretString::from(token)
}

/// A time-bounded proof of authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    /// Bearer token, redacted in `Debug` output.
    #[serde(serialize_with = "serialize_token", deserialize_with = "deserialize_token")]
    pub token: SecretString,
    /// Expiry as milliseconds since the Unix epoch on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Issue a fresh session for `user` lasting `ttl` from `now`.
    ///
    /// The expiry saturates at the latest representable instant.
    #[must_use]
    pub fn issue(user: User, ttl: Duration, now: DateTime<Utc>) -> Self {
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(user, generate_token(), expires_at)
    }

    /// Build a session, truncating `expires_at` to the millisecond
    /// precision it is stored with.
    #[must_use]
    pub fn new(user: User, token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            user,
            token,
            expires_at: expires_at.trunc_subsecs(3),
        }
    }

    /// Whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user
            && self.expires_at == other.expires_at
            && self.token.expose_secret() == other.token.expose_secret()
    }
}

impl Eq for Session {}

fn serialize_token<S: Serializer>(token: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose_secret())
}

fn deserialize_token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}
