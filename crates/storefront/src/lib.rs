//! Pocket Store storefront library.
//!
//! Catalog browsing, authentication, the cart and order engines, and the
//! [`state::Storefront`] container that wires them together. Front ends
//! (the `pstore` CLI, tests) drive everything through `Storefront`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use error::{AppError, Result};
pub use state::{CheckoutError, Storefront};
