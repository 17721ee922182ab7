//! The catalog query engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::instrument;

use crate::api::StoreClient;
use crate::catalog::{FilterCriteria, OrderCriteria, QueryKey, SortField};
use crate::models::Product;

/// The catalog page's product list and the criteria driving it.
///
/// Cheaply cloneable; all clones share one engine. Every criteria change
/// derives the current [`QueryKey`], fetches the list for it, and replaces
/// the published list wholesale with the response. Responses are applied in
/// issue order: a response belonging to an older request than the last one
/// applied is discarded, so the latest-issued request always wins no matter
/// how the network reorders replies.
///
/// Fetch failures are logged and leave the published list untouched, which
/// is why the mutators have no error to return.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    client: StoreClient,
    state: Mutex<EngineState>,
    products_tx: watch::Sender<Vec<Product>>,
}

#[derive(Default)]
struct EngineState {
    order: OrderCriteria,
    filter: FilterCriteria,
    /// Sequence number of the most recently issued request.
    issued: u64,
    /// Sequence number of the most recently applied response.
    applied: u64,
}

/// One issued request: its sequence number and the key it was derived from.
///
/// Captured atomically with the criteria change, before any await.
struct FetchTicket {
    seq: u64,
    key: QueryKey,
}

impl EngineState {
    fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            seq: self.issued,
            key: QueryKey::derive(self.order, &self.filter),
        }
    }
}

impl Catalog {
    /// Creates an engine over `client` with default criteria (name
    /// ascending, no filter) and an empty list. Nothing is fetched until a
    /// mutator or [`Catalog::refresh`] runs.
    #[must_use]
    pub fn new(client: StoreClient) -> Self {
        let (products_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(CatalogInner {
                client,
                state: Mutex::new(EngineState::default()),
                products_tx,
            }),
        }
    }

    /// Applies a click on a sort control and re-queries.
    ///
    /// Clicking the active field flips its direction; clicking the other
    /// field activates it in ascending order.
    #[instrument(skip(self))]
    pub async fn set_sort_field(&self, field: SortField) {
        let ticket = {
            let mut state = self.lock_state();
            state.order.toggle(field);
            state.issue()
        };
        self.run_fetch(ticket).await;
    }

    /// Replaces the free-text filter and re-queries.
    ///
    /// The promo flag is untouched; while it is set, the new text does not
    /// show up in the key but is retained for when the flag clears.
    #[instrument(skip(self))]
    pub async fn set_text_filter(&self, text: &str) {
        let ticket = {
            let mut state = self.lock_state();
            state.filter.text = text.to_owned();
            state.issue()
        };
        self.run_fetch(ticket).await;
    }

    /// Sets the promo-only flag and re-queries.
    ///
    /// The stored filter text is untouched.
    #[instrument(skip(self))]
    pub async fn set_promo_only(&self, promo_only: bool) {
        let ticket = {
            let mut state = self.lock_state();
            state.filter.promo_only = promo_only;
            state.issue()
        };
        self.run_fetch(ticket).await;
    }

    /// Re-queries with the current criteria.
    ///
    /// Used for the initial page fetch and after cart changes.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let ticket = self.lock_state().issue();
        self.run_fetch(ticket).await;
    }

    /// The currently published product list.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner.products_tx.borrow().clone()
    }

    /// Subscribes to product list changes.
    ///
    /// The receiver starts at the current list and is notified after every
    /// applied fetch.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Product>> {
        self.inner.products_tx.subscribe()
    }

    /// The current sort criteria.
    #[must_use]
    pub fn order(&self) -> OrderCriteria {
        self.lock_state().order
    }

    /// The current filter criteria.
    #[must_use]
    pub fn filter(&self) -> FilterCriteria {
        self.lock_state().filter.clone()
    }

    /// The key the current criteria derive.
    #[must_use]
    pub fn query_key(&self) -> QueryKey {
        let state = self.lock_state();
        QueryKey::derive(state.order, &state.filter)
    }

    async fn run_fetch(&self, ticket: FetchTicket) {
        match self.inner.client.fetch_products(&ticket.key).await {
            Ok(products) => self.apply(&ticket, products),
            Err(error) => {
                tracing::warn!(
                    key = %ticket.key,
                    %error,
                    "catalog fetch failed, keeping previous list"
                );
            }
        }
    }

    /// Installs a response unless a newer request has been applied since it
    /// was issued.
    fn apply(&self, ticket: &FetchTicket, products: Vec<Product>) {
        let mut state = self.lock_state();
        if ticket.seq <= state.applied {
            tracing::debug!(
                key = %ticket.key,
                seq = ticket.seq,
                applied = state.applied,
                "discarding stale catalog response"
            );
            return;
        }
        state.applied = ticket.seq;
        // Published under the lock so snapshots go out in apply order.
        self.inner.products_tx.send_replace(products);
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use vitrine_core::{ProductId, ProductStatus};

    use super::*;

    fn test_catalog() -> Catalog {
        // Never actually contacted by these tests.
        let client = StoreClient::with_base_url("http://localhost:9", 1)
            .expect("client construction should not fail");
        Catalog::new(client)
    }

    fn sample_product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(100, 1),
            promo_price: Decimal::new(90, 1),
            status_flag: ProductStatus::Active,
            category: "canecas".to_owned(),
        }
    }

    fn ticket(catalog: &Catalog) -> FetchTicket {
        catalog.lock_state().issue()
    }

    #[test]
    fn test_issue_numbers_are_monotonic() {
        let catalog = test_catalog();
        let first = ticket(&catalog);
        let second = ticket(&catalog);
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
    }

    #[test]
    fn test_apply_in_order_replaces_list() {
        let catalog = test_catalog();
        let first = ticket(&catalog);
        let second = ticket(&catalog);

        catalog.apply(&first, vec![sample_product("a")]);
        catalog.apply(&second, vec![sample_product("b")]);

        let products = catalog.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "b");
    }

    #[test]
    fn test_apply_discards_stale_response() {
        let catalog = test_catalog();
        let older = ticket(&catalog);
        let newer = ticket(&catalog);

        // The newer request's response arrives first.
        catalog.apply(&newer, vec![sample_product("new")]);
        catalog.apply(&older, vec![sample_product("old")]);

        let products = catalog.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "new");
    }

    #[test]
    fn test_apply_notifies_subscribers() {
        let catalog = test_catalog();
        let mut rx = catalog.subscribe();
        assert!(rx.borrow().is_empty());

        let first = ticket(&catalog);
        catalog.apply(&first, vec![sample_product("a")]);

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn test_stale_apply_does_not_notify() {
        let catalog = test_catalog();
        let older = ticket(&catalog);
        let newer = ticket(&catalog);

        catalog.apply(&newer, vec![sample_product("new")]);

        let mut rx = catalog.subscribe();
        rx.mark_unchanged();
        catalog.apply(&older, vec![sample_product("old")]);
        assert!(!rx.has_changed().unwrap());
    }
}
