//! Domain models for the storefront.
//!
//! - [`product`] - catalog products (read-only, owned by the catalog API)
//! - [`cart`] - cart line items and the totals invariant
//! - [`order`] - orders, shipping addresses and price summaries
//! - [`user`] - user identity
//! - [`session`] - authenticated sessions

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLineItem};
pub use order::{Order, OrderCounts, OrderSummary, ShippingAddress};
pub use product::{Product, Rating};
pub use session::Session;
pub use user::User;
