//! Pocket Store Core - Shared types library.
//!
//! This crate provides common types used across all Pocket Store components:
//! - `pocket-store` - Catalog client, auth, cart and order engines
//! - `pocket-store-cli` - Command-line storefront driver
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
