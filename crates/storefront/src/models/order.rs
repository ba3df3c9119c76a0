//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pocket_store_core::{Money, OrderId, OrderStatus, UserId};

use super::cart::CartLineItem;

/// Sales tax applied at checkout, in percent.
pub const TAX_RATE_PERCENT: Decimal = Decimal::from_parts(7, 0, 0, false, 0);

/// A placed order.
///
/// Items and totals are a snapshot taken at checkout. Only `status` and
/// `updated_at` change afterwards, and only through
/// [`crate::services::orders::OrderEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<CartLineItem>,
    pub total_amount: Money,
    pub total_quantity: u32,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Price breakdown for this order.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary::for_subtotal(self.total_amount)
    }
}

/// Subtotal, shipping, tax and grand total for a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Free shipping, 7% tax.
    #[must_use]
    pub fn for_subtotal(subtotal: Money) -> Self {
        let shipping = Money::ZERO;
        let tax = subtotal.percent(TAX_RATE_PERCENT);
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

/// Number of orders in each status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderCounts {
    pub new: usize,
    pub paid: usize,
    pub delivered: usize,
}

impl OrderCounts {
    /// Count orders by status.
    pub fn tally<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders
            .into_iter()
            .fold(Self::default(), |mut counts, order| {
                match order.status {
                    OrderStatus::New => counts.new += 1,
                    OrderStatus::Paid => counts.paid += 1,
                    OrderStatus::Delivered => counts.delivered += 1,
                }
                counts
            })
    }

    /// Total across all statuses.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.new + self.paid + self.delivered
    }
}

/// Shipping address validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required shipping fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// Where an order is shipped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone_number: String,
}

impl ShippingAddress {
    /// Check that every required field is non-blank.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` listing each blank required field.
    pub fn validate(&self) -> Result<(), MissingFields> {
        let required = [
            ("full_name", &self.full_name),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
            ("country", &self.country),
            ("phone_number", &self.phone_number),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingFields(missing))
        }
    }
}
