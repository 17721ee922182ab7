//! Cart quantity ledger.
//!
//! Client-side only state: a map from product id to a line holding the
//! product snapshot and a quantity. The derived item total is recomputed
//! from the live map on every read, never cached, so every surface showing
//! it (header badge, cart modal) agrees by construction. Nothing here is
//! persisted; an abandoned cart is simply dropped.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use vitrine_core::ProductId;

use crate::models::Product;

/// One cart line: a product snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    /// The product as it looked when first added.
    pub product: Product,
    /// Count of this product in the cart, at least 1 while the line exists.
    pub quantity: u32,
}

/// The cart's quantity ledger.
///
/// Plain single-owner state; the shared [`Cart`] handle wraps it for
/// concurrent use. Lines are keyed by product id, so iteration order is
/// the id order, stable across mutations.
#[derive(Debug, Clone, Default)]
pub struct CartLedger {
    lines: BTreeMap<ProductId, CartLine>,
}

impl CartLedger {
    /// Adds one unit of `product`, creating the line on first add.
    pub fn add(&mut self, product: Product) {
        self.lines
            .entry(product.id.clone())
            .and_modify(|line| line.quantity += 1)
            .or_insert_with(|| CartLine {
                product,
                quantity: 1,
            });
    }

    /// Adds one to the line's quantity. Missing ids are a silent no-op.
    pub fn increment(&mut self, id: &ProductId) {
        if let Some(line) = self.lines.get_mut(id) {
            line.quantity += 1;
        }
    }

    /// Removes one from the line's quantity, dropping the whole line when it
    /// reaches zero. Missing ids are a silent no-op.
    pub fn decrement(&mut self, id: &ProductId) {
        if let Some(line) = self.lines.get_mut(id) {
            line.quantity -= 1;
            if line.quantity == 0 {
                self.lines.remove(id);
            }
        }
    }

    /// Total number of items across all lines, recomputed on every call.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines.values().map(|line| line.quantity).sum()
    }

    /// The line for a product id, if present.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.get(id)
    }

    /// Lines in product-id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Immutable cart view published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartSnapshot {
    /// Lines in product-id order.
    pub lines: Vec<CartLine>,
    /// Sum of quantities across lines.
    pub total_items: u32,
}

impl CartSnapshot {
    fn of(ledger: &CartLedger) -> Self {
        Self {
            lines: ledger.lines().cloned().collect(),
            total_items: ledger.total_items(),
        }
    }
}

/// Shared cart handle.
///
/// Cheaply cloneable; every clone mutates the same ledger. Each mutation
/// publishes a fresh [`CartSnapshot`], so the header badge and the cart
/// modal render from the same state without owning any of their own.
#[derive(Clone)]
pub struct Cart {
    inner: Arc<CartInner>,
}

struct CartInner {
    ledger: Mutex<CartLedger>,
    snapshot_tx: watch::Sender<CartSnapshot>,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(CartSnapshot::default());
        Self {
            inner: Arc::new(CartInner {
                ledger: Mutex::new(CartLedger::default()),
                snapshot_tx,
            }),
        }
    }

    /// Adds one unit of `product`, creating the line on first add.
    pub fn add(&self, product: Product) {
        self.mutate(|ledger| ledger.add(product));
    }

    /// Adds one to the line's quantity. Missing ids are a silent no-op.
    pub fn increment(&self, id: &ProductId) {
        self.mutate(|ledger| ledger.increment(id));
    }

    /// Removes one from the line's quantity, dropping the line at zero.
    /// Missing ids are a silent no-op.
    pub fn decrement(&self, id: &ProductId) {
        self.mutate(|ledger| ledger.decrement(id));
    }

    /// Current item total.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lock_ledger().total_items()
    }

    /// Current cart view.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Subscribes to cart changes.
    ///
    /// The receiver starts at the current view and is notified after every
    /// mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    fn mutate(&self, op: impl FnOnce(&mut CartLedger)) {
        let mut ledger = self.lock_ledger();
        op(&mut ledger);
        let snapshot = CartSnapshot::of(&ledger);
        // Published under the lock so snapshots go out in mutation order.
        self.inner.snapshot_tx.send_replace(snapshot);
    }

    fn lock_ledger(&self) -> MutexGuard<'_, CartLedger> {
        self.inner
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use vitrine_core::ProductStatus;

    use super::*;

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

    #[test]
    fn test_add_twice_increments_quantity() {
        let mut ledger = CartLedger::default();
        ledger.add(sample_product("a"));
        ledger.add(sample_product("a"));

        assert_eq!(ledger.len(), 1);
        let line = ledger.line(&ProductId::new("a")).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(ledger.total_items(), 2);
    }

    #[test]
    fn test_total_sums_across_lines() {
        let mut ledger = CartLedger::default();
        ledger.add(sample_product("a"));
        ledger.add(sample_product("b"));
        ledger.add(sample_product("b"));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total_items(), 3);
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let id = ProductId::new("a");
        let mut ledger = CartLedger::default();
        ledger.add(sample_product("a"));
        ledger.decrement(&id);

        assert!(ledger.is_empty());
        assert_eq!(ledger.total_items(), 0);

        // The line is gone, so a later increment has nothing to act on.
        ledger.increment(&id);
        assert!(ledger.is_empty());
        assert_eq!(ledger.total_items(), 0);
    }

    #[test]
    fn test_increment_missing_id_is_noop() {
        let mut ledger = CartLedger::default();
        ledger.add(sample_product("a"));
        ledger.increment(&ProductId::new("ghost"));
        ledger.decrement(&ProductId::new("ghost"));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.total_items(), 1);
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let id = ProductId::new("a");
        let mut ledger = CartLedger::default();

        ledger.add(sample_product("a"));
        assert_eq!(ledger.total_items(), 1);
        ledger.increment(&id);
        assert_eq!(ledger.total_items(), 2);
        ledger.decrement(&id);
        assert_eq!(ledger.total_items(), 1);
    }

    #[test]
    fn test_lines_iterate_in_id_order() {
        let mut ledger = CartLedger::default();
        ledger.add(sample_product("b"));
        ledger.add(sample_product("a"));

        let ids: Vec<&str> = ledger.lines().map(|l| l.product.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_handle_publishes_snapshots() {
        let cart = Cart::new();
        let mut rx = cart.subscribe();
        assert_eq!(rx.borrow().total_items, 0);

        cart.add(sample_product("a"));
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.total_items, 1);
        assert_eq!(snapshot.lines.len(), 1);
    }

    #[test]
    fn test_handle_clones_share_state() {
        let cart = Cart::new();
        let other = cart.clone();

        cart.add(sample_product("a"));
        other.increment(&ProductId::new("a"));

        assert_eq!(cart.total_items(), 2);
        assert_eq!(other.snapshot().total_items, 2);
    }
}
