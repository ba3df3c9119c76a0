//! Key-value persistence for carts, orders, users and sessions.
//!
//! Values are JSON documents stored under string keys. The store is the
//! only durable state the storefront owns; products are always read from the
//! catalog API.
//!
//! # Keys
//!
//! - `cart-{userId}` - the user's cart line items
//! - `orders-{userId}` - the user's order list, newest first
//! - `auth-session` - the active session (one per device)
//! - `users-table` - local auth users, keyed by normalized email
//!
//! # Backends
//!
//! - [`MemoryStore`] - process-local map, used by tests
//! - [`FileStore`] - one JSON file per key under a data directory

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use pocket_store_core::UserId;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded.
    #[error("data corruption: {0}")]
    DataCorruption(#[from] serde_json::Error),

    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// A string-keyed store of JSON values.
///
/// Implementations must be last-write-wins: `set` replaces the whole value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a typed value.
///
/// # Errors
///
/// Returns `StorageError::DataCorruption` if the stored JSON does not match
/// `T`, or any backend error.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode and write a typed value.
///
/// # Errors
///
/// Returns `StorageError::DataCorruption` if `value` cannot be encoded, or
/// any backend error.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    store.set(key, serde_json::to_value(value)?).await
}

/// Storage key builders.
pub mod keys {
    use super::UserId;

    /// Key for the active auth session.
    pub const AUTH_SESSION: &str = "auth-session";

    /// Key for the local auth users table.
    pub const USERS_TABLE: &str = "users-table";

    /// Key for a user's cart.
    #[must_use]
    pub fn cart(user_id: &UserId) -> String {
        format!("cart-{user_id}")
    }

    /// Key for a user's orders.
    #[must_use]
    pub fn orders(user_id: &UserId) -> String {
        format!("orders-{user_id}")
    }
}

/// Store whose writes always fail.
#[cfg(test)]
pub(crate) struct ReadOnlyStore;

#[cfg(test)]
#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: serde_json::Value) -> Result<(), StorageError> {
        Err(StorageError::InvalidKey(key.to_owned()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
