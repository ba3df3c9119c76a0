//! Cache types for catalog API responses.

use pocket_store_core::ProductId;

use crate::models::Product;

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Products,
    ProductsInCategory(String),
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<String>),
    Products(Vec<Product>),
    Product(Box<Product>),
}
