//! Storefront state container.
//!
//! [`Storefront`] owns the catalog client, the auth service and the cart
//! and order engines, and wires the follow-up actions between them:
//!
//! - sign-in (or a restored session) loads that user's cart and orders
//! - sign-out saves the cart, then clears cart and orders in memory
//! - checkout turns the cart into an order and empties the cart

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use pocket_store_core::ProductId;

use crate::catalog::CatalogClient;
use crate::config::{AuthBackendConfig, StoreConfig};
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::order::MissingFields;
use crate::models::{Order, OrderSummary, Product, Session, ShippingAddress, User};
use crate::services::auth::{HostedAuthService, LocalAuthService, SharedAuthService};
use crate::services::cart::CartEngine;
use crate::services::orders::{OrderEngine, OrderError};
use crate::storage::{FileStore, KeyValueStore};

/// Reasons checkout can be refused.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout needs a signed-in user.
    #[error("sign in to place an order")]
    NotSignedIn,

    /// Nothing to order.
    #[error("your cart is empty")]
    EmptyCart,

    /// Shipping address is incomplete.
    #[error(transparent)]
    InvalidAddress(#[from] MissingFields),

    /// The order could not be created.
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Client-side storefront state.
///
/// Passed explicitly by the caller; all mutation goes through `&mut self`.
pub struct Storefront {
    catalog: CatalogClient,
    auth: SharedAuthService,
    cart: CartEngine,
    orders: OrderEngine,
    session: Option<Session>,
}

impl Storefront {
    /// Build a storefront persisting to `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or a client
    /// cannot be built.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir).await?);
        Self::with_store(config, store)
    }

    /// Build a storefront on an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or hosted auth client cannot be built.
    pub fn with_store(config: &StoreConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let catalog = CatalogClient::new(config.catalog_url.clone(), config.catalog_cache_ttl)?;
        let auth: SharedAuthService = match &config.auth {
            AuthBackendConfig::Local { session_ttl } => {
                Arc::new(LocalAuthService::new(store.clone(), *session_ttl))
            }
            AuthBackendConfig::Hosted(hosted) => {
                Arc::new(HostedAuthService::new(hosted, store.clone())?)
            }
        };

        Ok(Self::from_parts(catalog, auth, store))
    }

    /// Assemble a storefront from ready-made parts.
    #[must_use]
    pub fn from_parts(
        catalog: CatalogClient,
        auth: SharedAuthService,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            catalog,
            auth,
            cart: CartEngine::new(store.clone()),
            orders: OrderEngine::new(store),
            session: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The catalog client.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// The active session, if signed in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// The cart engine.
    #[must_use]
    pub const fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// Mutable access to the cart engine.
    pub const fn cart_mut(&mut self) -> &mut CartEngine {
        &mut self.cart
    }

    /// The order engine.
    #[must_use]
    pub const fn orders(&self) -> &OrderEngine {
        &self.orders
    }

    /// Mutable access to the order engine.
    pub const fn orders_mut(&mut self) -> &mut OrderEngine {
        &mut self.orders
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Pick up a persisted session, loading that user's cart and orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    #[instrument(skip(self))]
    pub async fn restore_session(&mut self) -> Result<Option<&Session>> {
        match self.auth.get_session().await? {
            Some(session) => Ok(Some(self.start(session).await)),
            None => Ok(None),
        }
    }

    /// Register and sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` wrapped in `AppError` on rejection.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<&Session> {
        let session = self.auth.sign_up(email, password, name).await?;
        Ok(self.start(session).await)
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` wrapped in `AppError` on a
    /// bad email or password.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&Session> {
        let session = self.auth.sign_in(email, password).await?;
        Ok(self.start(session).await)
    }

    /// Save the cart, clear cart and orders, then end the session.
    ///
    /// In-memory state is cleared even if the auth backend fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be removed.
    #[instrument(skip(self))]
    pub async fn sign_out(&mut self) -> Result<()> {
        self.cart.save().await;
        self.cart.unbind();
        self.orders.clear();
        self.session = None;
        clear_sentry_user();

        self.auth.sign_out().await?;
        info!("Signed out");
        Ok(())
    }

    async fn start(&mut self, session: Session) -> &Session {
        set_sentry_user(&session.user.id, Some(session.user.email.as_str()));
        self.cart.load_for_user(&session.user.id).await;
        self.orders.load_for_user(&session.user.id).await;
        self.session.insert(session)
    }

    // =========================================================================
    // Shopping
    // =========================================================================

    /// Fetch a product and add one unit of it to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the product cannot be fetched or
    /// `CartError::NoOwner` if nobody is signed in.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&mut self, product_id: ProductId) -> Result<Product> {
        let product = self.catalog.product(product_id).await?;
        self.cart.add_item(&product).await?;
        let id = product_id.to_string();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
        Ok(product)
    }

    /// Price breakdown of the current cart.
    #[must_use]
    pub fn checkout_summary(&self) -> OrderSummary {
        OrderSummary::for_subtotal(self.cart.total_amount())
    }

    /// Place an order for the cart and empty it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if nobody is signed in, the cart is empty or
    /// the address is incomplete.
    #[instrument(skip(self, shipping))]
    pub async fn checkout(&mut self, shipping: ShippingAddress) -> Result<Order> {
        let user_id = self
            .session
            .as_ref()
            .map(|session| session.user.id.clone())
            .ok_or(CheckoutError::NotSignedIn)?;
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        shipping.validate().map_err(CheckoutError::from)?;

        let order = self
            .orders
            .create_order_with_shipping(
                &user_id,
                self.cart.items(),
                self.cart.total_amount(),
                self.cart.total_quantity(),
                shipping,
            )
            .await
            .map_err(CheckoutError::from)?;
        self.cart.clear().await;

        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
        Ok(order)
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("catalog", &self.catalog)
            .field("session", &self.session)
            .field("cart", &self.cart)
            .field("orders", &self.orders)
            .finish_non_exhaustive()
    }
}
