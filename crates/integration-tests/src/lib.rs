//! Integration tests for Pocket Store.
//!
//! Shared fixtures for the tests under `tests/`: a mock catalog API served by
//! `httpmock`, and storefronts backed by a temporary on-disk store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pocket-store-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;

use pocket_store::Storefront;
use pocket_store::config::StoreConfig;
use pocket_store::models::ShippingAddress;
use pocket_store::storage::{FileStore, KeyValueStore};

/// Catalog fixture: `(id, title, price, category)`.
pub const PRODUCTS: [(i32, &str, f64, &str); 4] = [
    (1, "Fjallraven - Foldsack No. 1 Backpack", 109.95, "men's clothing"),
    (5, "John Hardy Women's Legends Naga Bracelet", 695.0, "jewelery"),
    (9, "WD 2TB Elements Portable External Hard Drive", 64.0, "electronics"),
    (14, "Samsung 49-Inch Curved Gaming Monitor", 999.99, "electronics"),
];

/// JSON for one fixture product.
#[must_use]
pub fn product_json(id: i32) -> Value {
    let (id, title, price, category) = PRODUCTS
        .iter()
        .copied()
        .find(|(pid, ..)| *pid == id)
        .unwrap();
    json!({
        "id": id,
        "title": title,
        "price": price,
        "description": format!("{title} description"),
        "category": category,
        "image": format!("https://fakestoreapi.com/img/{id}.jpg"),
        "rating": { "rate": 4.2, "count": 100 + id }
    })
}

/// Start a mock catalog API serving [`PRODUCTS`].
///
/// Unknown product ids get an empty 200 response, matching the public API.
pub async fn start_catalog() -> MockServer {
    let server = MockServer::start_async().await;

    let mut categories: Vec<&str> = PRODUCTS.iter().map(|p| p.3).collect();
    categories.sort_unstable();
    categories.dedup();
    let all: Vec<Value> = PRODUCTS.iter().map(|p| product_json(p.0)).collect();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/products/categories");
            then.status(200).json_body(json!(categories));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(json!(all));
        })
        .await;
    for category in ["electronics", "jewelery"] {
        let matching: Vec<Value> = PRODUCTS
            .iter()
            .filter(|p| p.3 == category)
            .map(|p| product_json(p.0))
            .collect();
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/products/category/{category}"));
                then.status(200).json_body(json!(matching));
            })
            .await;
    }
    for (id, ..) in PRODUCTS {
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/products/{id}"));
                then.status(200).json_body(product_json(id));
            })
            .await;
    }
    server
        .mock_async(|when, then| {
            when.method(GET).path("/products/404");
            then.status(200).body("");
        })
        .await;

    server
}

/// Local-auth config pointing at `catalog` and persisting under `data_dir`.
#[must_use]
pub fn local_config(catalog: &MockServer, data_dir: impl Into<PathBuf>) -> StoreConfig {
    StoreConfig::local(Url::parse(&catalog.base_url()).unwrap(), data_dir)
}

/// Everything a storefront test needs, kept alive together.
pub struct TestContext {
    pub catalog: MockServer,
    pub data_dir: TempDir,
    pub config: StoreConfig,
}

impl TestContext {
    /// Mock catalog plus an empty data directory.
    pub async fn new() -> Self {
        let catalog = start_catalog().await;
        let data_dir = tempfile::tempdir().unwrap();
        let config = local_config(&catalog, data_dir.path());
        Self {
            catalog,
            data_dir,
            config,
        }
    }

    /// Open a storefront on the shared data directory, as a fresh process
    /// would, and restore any persisted session.
    pub async fn open(&self) -> Storefront {
        let mut storefront = Storefront::open(&self.config).await.unwrap();
        storefront.restore_session().await.unwrap();
        storefront
    }

    /// Direct handle on the data directory's store.
    pub async fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(FileStore::open(self.data_dir.path()).await.unwrap())
    }
}

/// A complete shipping address.
#[must_use]
pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ada Lovelace".to_owned(),
        address_line1: "12 Analytical Row".to_owned(),
        address_line2: Some("Flat 2".to_owned()),
        city: "London".to_owned(),
        state: "LDN".to_owned(),
        zip_code: "N1 9GU".to_owned(),
        country: "UK".to_owned(),
        phone_number: "+44 20 7946 0000".to_owned(),
    }
}
