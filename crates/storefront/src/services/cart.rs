//! Cart engine.
//!
//! Wraps the [`Cart`] reducer with per-user persistence. Every mutation is
//! followed by a best-effort write of the full item list under
//! `cart-{userId}`. A failed write is logged and the in-memory cart keeps
//! the change; there is no rollback or retry.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use pocket_store_core::{Money, ProductId, UserId};

use crate::models::{Cart, CartLineItem, Product};
use crate::storage::{self, KeyValueStore, keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No user is signed in, so the cart has nowhere to be saved.
    #[error("sign in to add items to your cart")]
    NoOwner,
}

/// The signed-in user's cart plus its persistence.
pub struct CartEngine {
    store: Arc<dyn KeyValueStore>,
    cart: Cart,
}

impl CartEngine {
    /// An engine with an empty, unbound cart.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cart: Cart::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        self.cart.items()
    }

    /// Sum of line quantities.
    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.cart.total_quantity()
    }

    /// Sum of line totals.
    #[must_use]
    pub const fn total_amount(&self) -> Money {
        self.cart.total_amount()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.cart.line_count()
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// User the cart belongs to.
    #[must_use]
    pub const fn owner(&self) -> Option<&UserId> {
        self.cart.owner()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoOwner` if no user is bound.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&mut self, product: &Product) -> Result<(), CartError> {
        if self.cart.owner().is_none() {
            return Err(CartError::NoOwner);
        }
        self.cart.add(product);
        self.persist().await;
        Ok(())
    }

    /// Remove a product's line whatever its quantity. No-op if absent.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, product_id: ProductId) {
        if self.cart.remove(product_id) {
            self.persist().await;
        }
    }

    /// Add one to a line's quantity. No-op if absent.
    #[instrument(skip(self))]
    pub async fn increase_quantity(&mut self, product_id: ProductId) {
        if self.cart.increase(product_id) {
            self.persist().await;
        }
    }

    /// Subtract one from a line's quantity, removing the line at zero.
    /// No-op if absent.
    #[instrument(skip(self))]
    pub async fn decrease_quantity(&mut self, product_id: ProductId) {
        if self.cart.decrease(product_id) {
            self.persist().await;
        }
    }

    /// Empty the cart, keeping its owner.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        self.cart.clear();
        self.persist().await;
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Replace the cart with `user_id`'s persisted items and bind it.
    ///
    /// Missing or unreadable data yields an empty cart.
    #[instrument(skip(self))]
    pub async fn load_for_user(&mut self, user_id: &UserId) {
        let key = keys::cart(user_id);
        let items = match storage::get_json::<Vec<CartLineItem>>(self.store.as_ref(), &key).await {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Could not load cart, starting empty");
                Vec::new()
            }
        };

        self.cart = Cart::for_owner(user_id.clone(), items);
        debug!(lines = self.cart.line_count(), "Cart loaded");
    }

    /// Write the current items now.
    pub async fn save(&self) {
        self.persist().await;
    }

    /// Drop items and owner without touching storage.
    pub fn unbind(&mut self) {
        self.cart.unbind();
    }

    async fn persist(&self) {
        let Some(owner) = self.cart.owner() else {
            return;
        };

        let key = keys::cart(owner);
        if let Err(e) = storage::set_json(self.store.as_ref(), &key, &self.cart.items()).await {
            warn!(error = %e, key = %key, "Failed to persist cart");
        }
    }
}

impl std::fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::models::Rating;
    use crate::storage::{MemoryStore, ReadOnlyStore};

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Money::new(Decimal::from_str(price).unwrap()),
            description: String::new(),
            category: "electronics".to_owned(),
            image: String::new(),
            rating: Rating::default(),
        }
    }

    async fn persisted(store: &MemoryStore, user: &UserId) -> Vec<CartLineItem> {
        storage::get_json(store, &keys::cart(user))
            .await
            .unwrap()
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_add_without_owner_is_rejected() {
        let mut engine = CartEngine::new(Arc::new(MemoryStore::new()));
        let err = engine.add_item(&product(1, "1")).await.unwrap_err();
        assert!(matches!(err, CartError::NoOwner));
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_per_user() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");
        let mut engine = CartEngine::new(store.clone());
        engine.load_for_user(&user).await;

        let p = product(1, "9.99");
        engine.add_item(&p).await.unwrap();
        engine.add_item(&p).await.unwrap();

        assert_eq!(engine.total_quantity(), 2);
        assert_eq!(engine.total_amount(), Money::from_cents(1998));
        let saved = persisted(&store, &user).await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].quantity, 2);

        engine.decrease_quantity(p.id).await;
        engine.decrease_quantity(p.id).await;
        assert!(engine.is_empty());
        assert!(persisted(&store, &user).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_restores_and_binds() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");

        let mut first = CartEngine::new(store.clone());
        first.load_for_user(&user).await;
        first.add_item(&product(1, "2")).await.unwrap();
        first.add_item(&product(2, "3")).await.unwrap();
        first.increase_quantity(ProductId::new(2)).await;

        let mut second = CartEngine::new(store.clone());
        second.load_for_user(&user).await;
        assert_eq!(second.owner(), Some(&user));
        assert_eq!(second.items(), first.items());
        assert_eq!(second.total_amount(), Money::from_cents(800));
    }

    #[tokio::test]
    async fn test_unreadable_cart_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");
        store
            .set(&keys::cart(&user), serde_json::json!("garbage"))
            .await
            .unwrap();

        let mut engine = CartEngine::new(store);
        engine.load_for_user(&user).await;
        assert!(engine.is_empty());
        assert_eq!(engine.owner(), Some(&user));
    }

    #[tokio::test]
    async fn test_unbind_leaves_storage_untouched() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");
        let mut engine = CartEngine::new(store.clone());
        engine.load_for_user(&user).await;
        engine.add_item(&product(5, "4.50")).await.unwrap();

        engine.unbind();
        assert!(engine.is_empty());
        assert!(engine.owner().is_none());
        assert_eq!(persisted(&store, &user).await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_in_memory_change() {
        let user = UserId::new("u1");
        let mut engine = CartEngine::new(Arc::new(ReadOnlyStore));
        engine.load_for_user(&user).await;

        engine.add_item(&product(1, "1.25")).await.unwrap();
        assert_eq!(engine.total_quantity(), 1);
        assert_eq!(engine.total_amount(), Money::from_cents(125));
    }

    #[tokio::test]
    async fn test_clear_keeps_owner_and_persists_empty_list() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new("u1");
        let mut engine = CartEngine::new(store.clone());
        engine.load_for_user(&user).await;
        engine.add_item(&product(1, "1")).await.unwrap();

        engine.clear().await;
        assert_eq!(engine.owner(), Some(&user));
        assert_eq!(engine.total_amount(), Money::ZERO);
        assert!(persisted(&store, &user).await.is_empty());
    }
}
