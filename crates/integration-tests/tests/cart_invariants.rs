//! Invariants that must hold for any sequence of cart operations.
//!
//! - no product appears on two lines
//! - every line has an amount of at least one, never above the stock
//! - the persisted snapshot always equals the published cart

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::time::Duration;

use cartsync::{Cart, FixtureCatalog, ProductId, UpdateProductAmount};
use cartsync_integration_tests::{TestCart, sneaker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PRODUCTS: i64 = 6;

fn assert_invariants(cart: &Cart, stock: &[u32]) {
    let mut seen = HashSet::new();
    for line in cart {
        assert!(
            seen.insert(line.product_id()),
            "duplicate line for {}",
            line.product_id()
        );
        assert!(line.amount >= 1, "line {} has amount 0", line.product_id());

        let index = usize::try_from(line.product_id().as_i64() - 1).unwrap();
        let available = stock.get(index).copied().unwrap_or(0);
        assert!(
            line.amount <= available,
            "line {} exceeds stock",
            line.product_id()
        );
    }
}

#[tokio::test]
async fn test_random_operation_sequences_keep_invariants() {
    for seed in 0..20_u64 {
        let mut rng = StdRng::seed_from_u64(seed);

        // product 6 has no stock record at all
        let mut catalog = FixtureCatalog::new();
        let mut stock = Vec::new();
        for id in 1..PRODUCTS {
            let amount: u32 = rng.random_range(0..=4);
            catalog = catalog.with_product(sneaker(id), i64::from(amount));
            stock.push(amount);
        }
        catalog.insert_product(sneaker(PRODUCTS));
        let t = TestCart::new(catalog);

        for _ in 0..60 {
            let id = ProductId::new(rng.random_range(1..=PRODUCTS));
            let before = t.store.cart();
            let writes_before = t.snapshot.writes();

            let result = match rng.random_range(0..3) {
                0 => t.store.add_product(id).await,
                1 => t.store.remove_product(id).await,
                _ => {
                    let amount = rng.random_range(0..=6);
                    t.store
                        .update_product_amount(UpdateProductAmount {
                            product_id: id,
                            amount,
                        })
                        .await
                }
            };

            if result.is_err() {
                assert_eq!(t.store.cart(), before, "failed op changed the cart");
                assert_eq!(t.snapshot.writes(), writes_before, "failed op wrote");
            } else {
                assert_eq!(t.snapshot.writes(), writes_before + 1);
            }

            assert_invariants(&t.store.cart(), &stock);
            t.assert_in_sync();
        }
    }
}

#[tokio::test]
async fn test_every_failure_is_reported_once() {
    let t = TestCart::new(FixtureCatalog::new().with_product(sneaker(1), 1));

    let outcomes = [
        t.store.add_product(ProductId::new(1)).await.is_err(),
        t.store.add_product(ProductId::new(1)).await.is_err(),
        t.store.remove_product(ProductId::new(2)).await.is_err(),
        t.store
            .update_product_amount(UpdateProductAmount {
                product_id: ProductId::new(1),
                amount: 0,
            })
            .await
            .is_err(),
    ];

    let failures = outcomes.iter().filter(|failed| **failed).count();
    assert_eq!(failures, 3);
    assert_eq!(t.notifier.messages().len(), failures);
}

#[tokio::test]
async fn test_concurrent_adds_of_same_product_never_duplicate() {
    let t = TestCart::new(
        FixtureCatalog::new()
            .with_product(sneaker(1), 10)
            .with_latency(Duration::from_millis(5)),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = t.store.clone();
            tokio::spawn(async move { store.add_product(ProductId::new(1)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cart = t.store.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.total_items(), 8);
    t.assert_in_sync();
}

#[tokio::test]
async fn test_concurrent_adds_stop_at_stock() {
    let t = TestCart::new(
        FixtureCatalog::new()
            .with_product(sneaker(1), 3)
            .with_latency(Duration::from_millis(2)),
    );

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = t.store.clone();
            tokio::spawn(async move { store.add_product(ProductId::new(1)).await })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }

    assert_eq!(ok, 3);
    assert_eq!(t.store.cart().total_items(), 3);
    assert_eq!(t.notifier.messages().len(), 3);
    t.assert_in_sync();
}
