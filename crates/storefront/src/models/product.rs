//! Catalog product types.
//!
//! Field names match the catalog API's JSON so responses decode directly.

use serde::{Deserialize, Serialize};

use pocket_store_core::{Money, ProductId};

/// A product as returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub description: String,
    pub category: String,
    /// Image URL.
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

/// Aggregate customer rating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    /// Average score out of 5.
    pub rate: f64,
    /// Number of ratings.
    pub count: u32,
}
