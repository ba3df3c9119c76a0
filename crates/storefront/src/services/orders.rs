//! Order engine.
//!
//! Turns cart snapshots into orders and drives their status through
//! `new → paid → delivered`. The loaded list is newest first and is written
//! back in full under `orders-{userId}` after each change.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use pocket_store_core::{Money, OrderId, OrderStatus, UserId};

use crate::models::{CartLineItem, Order, OrderCounts, ShippingAddress};
use crate::services::random_base36;
use crate::storage::{self, KeyValueStore, keys};

/// Length of the random suffix in order ids.
const ORDER_ID_SUFFIX_LENGTH: usize = 9;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order with this id in the loaded list.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The status change is not the next step of the lifecycle.
    #[error("order {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// An order needs at least one line item.
    #[error("cannot place an order with no items")]
    EmptyOrder,
}

/// The signed-in user's orders plus their persistence.
pub struct OrderEngine {
    store: Arc<dyn KeyValueStore>,
    owner: Option<UserId>,
    orders: Vec<Order>,
}

impl OrderEngine {
    /// An engine with no orders loaded.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            owner: None,
            orders: Vec::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Loaded orders, newest first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Look up an order.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id == id)
    }

    /// Orders in `status`, newest first.
    pub fn by_status(&self, status: OrderStatus) -> impl Iterator<Item = &Order> {
        self.orders
            .iter()
            .filter(move |order| order.status == status)
    }

    /// Order count per status.
    #[must_use]
    pub fn counts(&self) -> OrderCounts {
        OrderCounts::tally(&self.orders)
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Place an order for `user_id` from a snapshot of cart lines.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyOrder` if `items` is empty.
    pub async fn create_order(
        &mut self,
        user_id: &UserId,
        items: &[CartLineItem],
        total_amount: Money,
        total_quantity: u32,
    ) -> Result<Order, OrderError> {
        self.place(user_id, items, total_amount, total_quantity, None)
            .await
    }

    /// Same as [`Self::create_order`], recording where to ship.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyOrder` if `items` is empty.
    pub async fn create_order_with_shipping(
        &mut self,
        user_id: &UserId,
        items: &[CartLineItem],
        total_amount: Money,
        total_quantity: u32,
        shipping: ShippingAddress,
    ) -> Result<Order, OrderError> {
        self.place(user_id, items, total_amount, total_quantity, Some(shipping))
            .await
    }

    #[instrument(skip(self, items, shipping), fields(lines = items.len()))]
    async fn place(
        &mut self,
        user_id: &UserId,
        items: &[CartLineItem],
        total_amount: Money,
        total_quantity: u32,
        shipping: Option<ShippingAddress>,
    ) -> Result<Order, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if self.owner.as_ref() != Some(user_id) {
            self.load_for_user(user_id).await;
        }

        let now = Utc::now();
        let id = loop {
            let candidate = OrderId::new(format!(
                "order_{}_{}",
                now.timestamp_millis(),
                random_base36(ORDER_ID_SUFFIX_LENGTH)
            ));
            if self.get(&candidate).is_none() {
                break candidate;
            }
        };

        let order = Order {
            id,
            user_id: user_id.clone(),
            items: items.to_vec(),
            total_amount,
            total_quantity,
            status: OrderStatus::New,
            shipping,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(0, order.clone());
        self.persist().await;

        info!(order_id = %order.id, total = %order.total_amount, "Order placed");
        Ok(order)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Move an order to `status`.
    ///
    /// Only the next step is allowed: `new → paid` and `paid → delivered`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::InvalidTransition`;
    /// the order is left unchanged in both cases.
    #[instrument(skip(self))]
    pub async fn update_status(
        &mut self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<&Order, OrderError> {
        let index = self
            .orders
            .iter()
            .position(|order| &order.id == id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;

        if let Some(order) = self.orders.get_mut(index) {
            if !order.status.can_transition_to(status) {
                return Err(OrderError::InvalidTransition {
                    id: id.clone(),
                    from: order.status,
                    to: status,
                });
            }
            order.status = status;
            order.updated_at = Utc::now();
        }
        self.persist().await;

        info!(order_id = %id, status = %status, "Order status updated");
        self.orders
            .get(index)
            .ok_or_else(|| OrderError::NotFound(id.clone()))
    }

    /// Mark a new order as paid.
    ///
    /// # Errors
    ///
    /// See [`Self::update_status`].
    pub async fn mark_paid(&mut self, id: &OrderId) -> Result<&Order, OrderError> {
        self.update_status(id, OrderStatus::Paid).await
    }

    /// Mark a paid order as delivered.
    ///
    /// # Errors
    ///
    /// See [`Self::update_status`].
    pub async fn mark_delivered(&mut self, id: &OrderId) -> Result<&Order, OrderError> {
        self.update_status(id, OrderStatus::Delivered).await
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Replace the loaded list with `user_id`'s persisted orders.
    ///
    /// Missing or unreadable data yields an empty list.
    #[instrument(skip(self))]
    pub async fn load_for_user(&mut self, user_id: &UserId) {
        let key = keys::orders(user_id);
        self.orders = match storage::get_json::<Vec<Order>>(self.store.as_ref(), &key).await {
            Ok(orders) => orders.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Could not load orders, starting empty");
                Vec::new()
            }
        };
        self.owner = Some(user_id.clone());
    }

    /// Forget the loaded orders. Persisted data is untouched.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.owner = None;
    }

    async fn persist(&self) {
        let Some(owner) = &self.owner else {
            return;
        };

        let key = keys::orders(owner);
        if let Err(e) = storage::set_json(self.store.as_ref(), &key, &self.orders).await {
            warn!(error = %e, key = %key, "Failed to persist orders");
        }
    }
}

impl std::fmt::Debug for OrderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderEngine")
            .field("owner", &self.owner)
            .field("orders", &self.orders.len())
            .finish_non_exhaustive()
    }
}
