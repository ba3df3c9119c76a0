//! Cart domain types.
//!
//! [`Cart`] is a pure reducer: every mutation recomputes both totals from
//! the line items, so they can never drift. Persistence lives in
//! [`crate::services::cart::CartEngine`].

use serde::{Deserialize, Serialize};

use pocket_store_core::{Money, ProductId, UserId};

use super::product::Product;

/// One product entry in a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub title: String,
    /// Unit price at the time the product was added.
    pub price: Money,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
    /// Image URL.
    pub image: String,
}

impl CartLineItem {
    /// A new line for `product` with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            price: product.price,
            quantity: 1,
            image: product.image.clone(),
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// The signed-in user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    owner: Option<UserId>,
    items: Vec<CartLineItem>,
    total_quantity: u32,
    total_amount: Money,
}

impl Cart {
    /// An empty cart with no owner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cart bound to `owner` holding `items`.
    ///
    /// Items with zero quantity are dropped and duplicate product ids are
    /// merged, so a hand-edited or stale persisted list still yields a valid
    /// cart.
    #[must_use]
    pub fn for_owner(owner: UserId, items: Vec<CartLineItem>) -> Self {
        let mut cart = Self {
            owner: Some(owner),
            ..Self::default()
        };
        cart.replace_items(items);
        cart
    }

    /// Owning user, if bound.
    #[must_use]
    pub const fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Sum of line quantities.
    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub const fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Number of distinct products.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Add one unit of `product`, inserting a new line if needed.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.items.push(CartLineItem::from_product(product));
        }
        self.recompute();
    }

    /// Remove the line for `product_id` whatever its quantity.
    ///
    /// Returns `false` if there was no such line.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        let changed = self.items.len() != before;
        self.recompute();
        changed
    }

    /// Add one to the line's quantity.
    ///
    /// Returns `false` if there was no such line.
    pub fn increase(&mut self, product_id: ProductId) -> bool {
        let changed = self.line_mut(product_id).is_some_and(|line| {
            line.quantity = line.quantity.saturating_add(1);
            true
        });
        self.recompute();
        changed
    }

    /// Subtract one from the line's quantity, removing it at zero.
    ///
    /// Returns `false` if there was no such line.
    pub fn decrease(&mut self, product_id: ProductId) -> bool {
        let Some(index) = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
        else {
            return false;
        };

        let remove = self.items.get_mut(index).is_some_and(|line| {
            if line.quantity <= 1 {
                true
            } else {
                line.quantity -= 1;
                false
            }
        });
        if remove {
            self.items.remove(index);
        }
        self.recompute();
        true
    }

    /// Drop all lines. The owner is kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    /// Bind the cart to a user.
    pub fn bind(&mut self, owner: UserId) {
        self.owner = Some(owner);
    }

    /// Drop all lines and the owner.
    pub fn unbind(&mut self) {
        self.owner = None;
        self.clear();
    }

    /// Replace all lines, normalizing zero quantities and duplicates.
    pub fn replace_items(&mut self, items: Vec<CartLineItem>) {
        self.items.clear();
        for item in items.into_iter().filter(|item| item.quantity > 0) {
            if let Some(existing) = self.line_mut(item.product_id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                self.items.push(item);
            }
        }
        self.recompute();
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }

    fn recompute(&mut self) {
        self.total_quantity = self
            .items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity));
        self.total_amount = self.items.iter().map(CartLineItem::line_total).sum();
    }
}
