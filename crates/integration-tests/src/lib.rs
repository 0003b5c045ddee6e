//! Integration tests for cartsync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartsync-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Store behavior end to end with fixture collaborators
//! - `cart_invariants` - Randomized operation sequences and concurrent writers
//! - `http_catalog` - `ApiClient` against a fake catalog API served by axum
//!
//! This library holds the shared fixtures those tests build on.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use cartsync::{
    Cart, CartStore, Collaborators, DEFAULT_SNAPSHOT_KEY, FixtureCatalog, MemoryNotifier,
    MemorySnapshotStore, Price, Product, ProductId,
};

/// A cart store wired to in-memory collaborators, with handles to each.
pub struct TestCart {
    pub store: CartStore,
    pub catalog: Arc<FixtureCatalog>,
    pub snapshot: Arc<MemorySnapshotStore>,
    pub notifier: Arc<MemoryNotifier>,
}

impl TestCart {
    /// Open a store over `catalog`, starting from an empty snapshot.
    #[must_use]
    pub fn new(catalog: FixtureCatalog) -> Self {
        Self::with_snapshot(catalog, MemorySnapshotStore::new())
    }

    /// Open a store over `catalog`, starting from `cart` already persisted.
    #[must_use]
    pub fn with_cart(catalog: FixtureCatalog, cart: &Cart) -> Self {
        let json = cart.to_json().unwrap();
        Self::with_snapshot(
            catalog,
            MemorySnapshotStore::new().with_entry(DEFAULT_SNAPSHOT_KEY, &json),
        )
    }

    fn with_snapshot(catalog: FixtureCatalog, snapshot: MemorySnapshotStore) -> Self {
        let catalog = Arc::new(catalog);
        let snapshot = Arc::new(snapshot);
        let notifier = Arc::new(MemoryNotifier::new());
        let store = CartStore::open(Collaborators::shared(
            catalog.clone(),
            snapshot.clone(),
            notifier.clone(),
        ));
        Self {
            store,
            catalog,
            snapshot,
            notifier,
        }
    }

    /// The cart as currently persisted, if anything was ever written.
    #[must_use]
    pub fn persisted(&self) -> Option<Cart> {
        self.snapshot
            .get(DEFAULT_SNAPSHOT_KEY)
            .map(|json| Cart::from_json(&json).unwrap())
    }

    /// Assert the persisted copy equals the published one.
    pub fn assert_in_sync(&self) {
        let persisted = self.persisted().unwrap_or_default();
        assert_eq!(persisted, self.store.cart(), "snapshot and published cart diverged");
    }
}

/// A sneaker product with a deterministic title, price and image.
#[must_use]
pub fn sneaker(id: i64) -> Product {
    Product::new(
        ProductId::new(id),
        format!("Tênis {id}"),
        Price::from_cents(9990 + id * 1000),
        format!("https://img.example/sneakers/{id}.jpg"),
    )
}

/// A cart holding `(id, amount)` lines of [`sneaker`] products.
#[must_use]
pub fn cart_of(lines: &[(i64, u32)]) -> Cart {
    Cart::from_lines(
        lines
            .iter()
            .map(|&(id, amount)| cartsync::CartLine::new(sneaker(id), amount))
            .collect(),
    )
    .unwrap()
}
