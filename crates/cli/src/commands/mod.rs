//! Command implementations.
//!
//! Each command writes plain text to the given writer so it can be tested
//! against a buffer.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::io::Write;

use thiserror::Error;

use pocket_store::AppError;
use pocket_store::models::{CartLineItem, Order, Product};

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Storefront operation failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

fn write_product(out: &mut impl Write, product: &Product) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<48}  {:>9}  {}",
        product.id.as_i32(),
        truncate(&product.title, 48),
        product.price.to_string(),
        product.category
    )
}

fn write_line_item(out: &mut impl Write, item: &CartLineItem) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<40}  {:>3} x {:>8}  = {:>9}",
        item.product_id.as_i32(),
        truncate(&item.title, 40),
        item.quantity,
        item.price.to_string(),
        item.line_total().to_string()
    )
}

fn write_order(out: &mut impl Write, order: &Order) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  [{}]  {} items  {}  placed {}",
        order.id,
        order.status,
        order.total_quantity,
        order.total_amount,
        order.created_at.format("%Y-%m-%d %H:%M")
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_owned()
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    use pocket_store::Storefront;
    use pocket_store::config::StoreConfig;
    use pocket_store::storage::MemoryStore;

    /// Mock catalog with a backpack (id 1) and a bracelet (id 5).
    pub(crate) async fn catalog() -> MockServer {
        let server = MockServer::start_async().await;
        let backpack = json!({
            "id": 1,
            "title": "Backpack",
            "price": 109.95,
            "description": "Fits a laptop",
            "category": "men's clothing",
            "image": "https://img.test/1.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        });
        let bracelet = json!({
            "id": 5,
            "title": "Bracelet",
            "price": 695.0,
            "description": "Silver",
            "category": "jewelery",
            "image": "https://img.test/5.jpg",
            "rating": { "rate": 4.6, "count": 400 }
        });

        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/categories");
                then.status(200).json_body(json!(["jewelery", "men's clothing"]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/category/electronics");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/1");
                then.status(200).json_body(backpack);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/5");
                then.status(200).json_body(bracelet);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/404");
                then.status(200).body("");
            })
            .await;
        server
    }

    /// In-memory storefront reading from `catalog_url`.
    pub(crate) fn storefront(catalog_url: &str) -> Storefront {
        let config = StoreConfig::local(Url::parse(catalog_url).unwrap(), "unused");
        Storefront::with_store(&config, Arc::new(MemoryStore::new())).unwrap()
    }

    /// Storefront with `ada@x.com` signed in.
    pub(crate) async fn signed_in(catalog: &MockServer) -> Storefront {
        let mut storefront = storefront(&catalog.base_url());
        storefront
            .sign_up("ada@x.com", "secret1", Some("Ada"))
            .await
            .unwrap();
        storefront
    }

    pub(crate) fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }
}
