//! Catalog API client.
//!
//! Read-only access to categories and products over plain HTTP GET with JSON
//! responses. Responses are cached in memory using `moka` (TTL from config,
//! 5 minutes by default).
//!
//! # Endpoints
//!
//! - `GET /products/categories` - category names
//! - `GET /products` - every product
//! - `GET /products/category/{name}` - products in one category
//! - `GET /products/{id}` - a single product
//!
//! # Example
//!
//! ```rust,ignore
//! use pocket_store::catalog::CatalogClient;
//!
//! let catalog = CatalogClient::new(config.catalog_url.clone(), config.catalog_cache_ttl)?;
//! for category in catalog.categories().await? {
//!     let products = catalog.products_in_category(&category).await?;
//! }
//! ```

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use pocket_store_core::ProductId;

use crate::models::Product;

use cache::{CacheKey, CacheValue};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CACHE_CAPACITY: u64 = 500;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure (DNS, connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("catalog API returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No product exists with this id.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// A request URL could not be built.
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: Url, cache_ttl: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pocket-store/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url,
                cache,
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Drop every cached response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Issue a GET and decode the JSON body.
    ///
    /// Returns `Ok(None)` for an empty or `null` body, which the API sends
    /// for unknown product ids.
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, CatalogError> {
        let url = self.endpoint(path)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }

        match serde_json::from_str(trimmed) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse catalog response"
                );
                Err(CatalogError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// List category names.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<String> = self
            .fetch("/products/categories")
            .await?
            .unwrap_or_default();

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self.fetch("/products").await?.unwrap_or_default();

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// List products in `category`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body is malformed.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn products_in_category(&self, category: &str) -> Result<Vec<Product>, CatalogError> {
        let cache_key = CacheKey::ProductsInCategory(category.to_owned());

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category products");
            return Ok(products);
        }

        let path = format!("/products/category/{}", urlencoding::encode(category));
        let products: Vec<Product> = self.fetch(&path).await?.unwrap_or_default();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the API has no such product, or
    /// another error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = match self.fetch(&format!("/products/{id}")).await {
            Ok(Some(product)) => product,
            Ok(None) | Err(CatalogError::Status { status: 404, .. }) => {
                return Err(CatalogError::NotFound(id));
            }
            Err(e) => return Err(e),
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> CatalogClient {
        CatalogClient::new(
            Url::parse(&server.base_url()).unwrap(),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    fn product_json(id: i32, price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Product {id}"),
            "price": price,
            "description": "desc",
            "category": "electronics",
            "image": "https://img.test/p.png",
            "rating": { "rate": 4.1, "count": 7 }
        })
    }

    #[tokio::test]
    async fn test_categories_decoded() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/products/categories");
                then.status(200)
                    .json_body(json!(["electronics", "jewelery"]));
            })
            .await;

        let categories = client_for(&server).categories().await.unwrap();
        assert_eq!(categories, vec!["electronics", "jewelery"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_repeat_requests_hit_cache() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/products/category/electronics");
                then.status(200)
                    .json_body(json!([product_json(9, 64.0), product_json(10, 109.0)]));
            })
            .await;

        let client = client_for(&server);
        let first = client.products_in_category("electronics").await.unwrap();
        let second = client.products_in_category("electronics").await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(503).body("maintenance");
            })
            .await;

        let err = client_for(&server).products().await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Status { status: 503, ref message } if message == "maintenance"
        ));
    }

    #[tokio::test]
    async fn test_empty_body_for_product_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/999");
                then.status(200).body("");
            })
            .await;

        let err = client_for(&server)
            .product(ProductId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id == ProductId::new(999)));
    }

    #[tokio::test]
    async fn test_product_decoded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/1");
                then.status(200).json_body(product_json(1, 9.99));
            })
            .await;

        let product = client_for(&server).product(ProductId::new(1)).await.unwrap();
        assert_eq!(product.price, pocket_store_core::Money::from_cents(999));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/categories");
                then.status(200).body("{\"oops\":");
            })
            .await;

        let err = client_for(&server).categories().await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = CatalogClient::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(60),
        )
        .unwrap();
        let err = client.categories().await.unwrap_err();
        assert!(matches!(err, CatalogError::Http(_)));
    }
}
