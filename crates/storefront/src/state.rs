//! Wired-up storefront page state.
//!
//! [`Storefront`] assembles the three stateful components over one shared
//! [`StoreClient`]: the catalog engine, the cart, and the session holder.
//! It also owns the one piece of cross-component behavior: every cart
//! mutation re-runs the current catalog query, while sign-in and sign-out
//! leave the list alone.

use std::sync::Arc;

use vitrine_core::ProductId;

use crate::api::{ApiError, StoreClient};
use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::models::Product;
use crate::session::{FileStore, KeyValueStore, Session};

/// Shared storefront state. Cheaply cloneable.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    catalog: Catalog,
    cart: Cart,
    session: Session,
}

impl Storefront {
    /// Builds the storefront with a [`FileStore`] at the configured
    /// session path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the configured base URL is unusable.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let store = Box::new(FileStore::new(config.session_file.clone()));
        Self::with_store(config, store)
    }

    /// Builds the storefront over an explicit session store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the configured base URL is unusable.
    pub fn with_store(
        config: StorefrontConfig,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let client = StoreClient::new(&config.api)?;
        let catalog = Catalog::new(client.clone());
        let cart = Cart::new();
        let session = Session::new(client, store, config.persist_rejected_sign_in);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                catalog,
                cart,
                session,
            }),
        })
    }

    /// Runs the first catalog fetch.
    ///
    /// Kept separate from construction so embedders decide when the page
    /// issues its first request. The catalog starts empty until this
    /// resolves.
    pub async fn init(&self) {
        self.inner.catalog.refresh().await;
    }

    /// Adds one unit of `product` to the cart, then re-runs the current
    /// catalog query.
    pub async fn add_to_cart(&self, product: Product) {
        self.inner.cart.add(product);
        self.inner.catalog.refresh().await;
    }

    /// Increments an existing cart line, then re-runs the current catalog
    /// query. Unknown ids leave the cart unchanged but still refresh.
    pub async fn increment_cart_line(&self, id: &ProductId) {
        self.inner.cart.increment(id);
        self.inner.catalog.refresh().await;
    }

    /// Decrements an existing cart line, removing it at zero, then re-runs
    /// the current catalog query. Unknown ids leave the cart unchanged but
    /// still refresh.
    pub async fn decrement_cart_line(&self, id: &ProductId) {
        self.inner.cart.decrement(id);
        self.inner.catalog.refresh().await;
    }

    /// The configuration this storefront was built from.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The catalog engine.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The cart.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.inner.cart
    }

    /// The session holder. Sign-in and sign-out go through here directly;
    /// they do not touch the catalog.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }
}
