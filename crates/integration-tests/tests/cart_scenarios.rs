//! End-to-end cart store scenarios with fixture collaborators.
//!
//! Each scenario checks three things: the returned error, the published
//! cart, and the persisted snapshot (including whether it was written at all).

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use cartsync::{
    CartError, CartStore, Collaborators, FileSnapshotStore, FixtureCatalog, MemoryNotifier,
    OUT_OF_STOCK_MESSAGE, ProductId, UpdateProductAmount,
};
use cartsync_integration_tests::{TestCart, cart_of, sneaker};

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_to_empty_cart() {
    let t = TestCart::new(FixtureCatalog::new().with_product(sneaker(1), 5));

    t.store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(t.store.cart(), cart_of(&[(1, 1)]));
    assert_eq!(t.persisted(), Some(cart_of(&[(1, 1)])));
    assert!(t.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_add_existing_beyond_stock() {
    let t = TestCart::with_cart(
        FixtureCatalog::new().with_product(sneaker(1), 1),
        &cart_of(&[(1, 1)]),
    );

    let err = t.store.add_product(ProductId::new(1)).await.unwrap_err();

    assert!(matches!(
        err,
        CartError::StockUnavailable {
            requested: 2,
            available: 1,
            ..
        }
    ));
    assert_eq!(t.store.cart(), cart_of(&[(1, 1)]));
    assert_eq!(t.snapshot.writes(), 0);
    assert_eq!(t.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
}

#[tokio::test]
async fn test_add_when_catalog_fails() {
    let catalog = FixtureCatalog::new().with_product(sneaker(9), 4);
    catalog.fail_products(ProductId::new(9));
    let t = TestCart::new(catalog);

    let err = t.store.add_product(ProductId::new(9)).await.unwrap_err();

    assert!(err.is_collaborator_failure());
    assert!(t.store.cart().is_empty());
    assert_eq!(t.snapshot.writes(), 0);
    assert!(t.persisted().is_none());
    assert_eq!(t.notifier.messages(), vec!["Failed to add product"]);
}

#[tokio::test]
async fn test_add_unknown_stock_record_is_collaborator_failure() {
    let t = TestCart::new(FixtureCatalog::new());

    let err = t.store.add_product(ProductId::new(42)).await.unwrap_err();

    assert!(err.is_collaborator_failure());
    assert_eq!(t.notifier.messages(), vec!["Failed to add product"]);
}

#[tokio::test]
async fn test_add_after_stock_record_removed_is_collaborator_failure() {
    let catalog = FixtureCatalog::new().with_product(sneaker(4), 3);
    catalog.remove_stock_record(ProductId::new(4));
    let t = TestCart::new(catalog);

    let err = t.store.add_product(ProductId::new(4)).await.unwrap_err();

    assert!(err.is_collaborator_failure());
    assert!(t.store.cart().is_empty());
    assert_eq!(t.snapshot.writes(), 0);
    assert_eq!(t.notifier.messages(), vec!["Failed to add product"]);
}

#[tokio::test]
async fn test_add_with_stock_amount_missing_is_out_of_stock() {
    let catalog = FixtureCatalog::new().with_product(sneaker(5), 3);
    catalog.clear_stock_amount(ProductId::new(5));
    let t = TestCart::new(catalog);

    let err = t.store.add_product(ProductId::new(5)).await.unwrap_err();

    assert!(err.is_stock_unavailable());
    assert_eq!(t.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
    assert_eq!(t.catalog.product_calls(), 0);
}

#[tokio::test]
async fn test_add_preserves_insertion_order() {
    let t = TestCart::new(
        FixtureCatalog::new()
            .with_product(sneaker(3), 5)
            .with_product(sneaker(1), 5)
            .with_product(sneaker(2), 5),
    );

    for id in [3, 1, 2, 1] {
        t.store.add_product(ProductId::new(id)).await.unwrap();
    }

    assert_eq!(t.store.cart(), cart_of(&[(3, 1), (1, 2), (2, 1)]));
    t.assert_in_sync();
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_to_zero_is_rejected() {
    let t = TestCart::with_cart(
        FixtureCatalog::new().with_product(sneaker(2), 10),
        &cart_of(&[(2, 3)]),
    );

    let err = t
        .store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(2),
            amount: 0,
        })
        .await
        .unwrap_err();

    assert!(err.is_stock_unavailable());
    assert_eq!(t.store.cart(), cart_of(&[(2, 3)]));
    assert_eq!(t.snapshot.writes(), 0);
}

#[tokio::test]
async fn test_update_beyond_stock() {
    let t = TestCart::with_cart(
        FixtureCatalog::new().with_product(sneaker(2), 5),
        &cart_of(&[(2, 3)]),
    );

    let err = t
        .store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(2),
            amount: 7,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CartError::StockUnavailable {
            requested: 7,
            available: 5,
            ..
        }
    ));
    assert_eq!(t.store.cart(), cart_of(&[(2, 3)]));
    assert_eq!(t.notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
}

#[tokio::test]
async fn test_update_within_stock_keeps_order() {
    let t = TestCart::with_cart(
        FixtureCatalog::new()
            .with_product(sneaker(1), 9)
            .with_product(sneaker(2), 9)
            .with_product(sneaker(3), 9),
        &cart_of(&[(1, 1), (2, 1), (3, 1)]),
    );

    t.store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(2),
            amount: 9,
        })
        .await
        .unwrap();

    assert_eq!(t.store.cart(), cart_of(&[(1, 1), (2, 9), (3, 1)]));
    t.assert_in_sync();
}

#[tokio::test]
async fn test_update_when_stock_lookup_fails() {
    let catalog = FixtureCatalog::new().with_product(sneaker(2), 9);
    catalog.fail_stock(ProductId::new(2));
    let t = TestCart::with_cart(catalog, &cart_of(&[(2, 3)]));

    let err = t
        .store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(2),
            amount: 4,
        })
        .await
        .unwrap_err();

    assert!(err.is_collaborator_failure());
    assert_eq!(t.store.cart(), cart_of(&[(2, 3)]));
    assert_eq!(
        t.notifier.messages(),
        vec!["Failed to update product quantity"]
    );
}

// =============================================================================
// Remove
// =============================================================================

#[tokio::test]
async fn test_remove_last_line() {
    let t = TestCart::with_cart(FixtureCatalog::new(), &cart_of(&[(3, 2)]));

    t.store.remove_product(ProductId::new(3)).await.unwrap();

    assert!(t.store.cart().is_empty());
    assert_eq!(t.snapshot.get(cartsync::DEFAULT_SNAPSHOT_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_remove_twice_fails_second_time() {
    let t = TestCart::with_cart(FixtureCatalog::new(), &cart_of(&[(3, 2), (4, 1)]));

    t.store.remove_product(ProductId::new(3)).await.unwrap();
    let err = t.store.remove_product(ProductId::new(3)).await.unwrap_err();

    assert!(err.is_line_not_found());
    assert_eq!(t.store.cart(), cart_of(&[(4, 1)]));
    assert_eq!(t.snapshot.writes(), 1);
    assert_eq!(t.notifier.messages(), vec!["Failed to remove product"]);
}

#[tokio::test]
async fn test_remove_makes_no_collaborator_calls() {
    let t = TestCart::with_cart(FixtureCatalog::new(), &cart_of(&[(3, 2)]));

    t.store.remove_product(ProductId::new(3)).await.unwrap();

    assert_eq!(t.catalog.stock_calls(), 0);
    assert_eq!(t.catalog.product_calls(), 0);
}

// =============================================================================
// Persistence across sessions
// =============================================================================

#[tokio::test]
async fn test_file_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(
        FixtureCatalog::new()
            .with_product(sneaker(1), 5)
            .with_product(sneaker(2), 5),
    );
    let open = || {
        CartStore::open_with_key(
            Collaborators::shared(
                catalog.clone(),
                Arc::new(FileSnapshotStore::new(dir.path())),
                Arc::new(MemoryNotifier::new()),
            ),
            "@Test:cart",
        )
    };

    let first = open();
    first.add_product(ProductId::new(2)).await.unwrap();
    first.add_product(ProductId::new(1)).await.unwrap();
    first.add_product(ProductId::new(1)).await.unwrap();
    let expected = first.cart();
    drop(first);

    let second = open();
    assert_eq!(second.key(), "@Test:cart");
    assert_eq!(second.cart(), expected);
    assert_eq!(second.cart(), cart_of(&[(2, 1), (1, 2)]));

    let files = FileSnapshotStore::new(dir.path());
    let path = files.path_for(second.key());
    assert_eq!(path.parent(), Some(files.dir()));
    assert!(path.exists());
}

#[tokio::test]
async fn test_catalog_amount_attribute_survives_reopen() {
    let mut record = sneaker(1);
    record
        .extra
        .insert("amount".to_string(), serde_json::Value::from(5));
    let t = TestCart::new(FixtureCatalog::new().with_product(record, 5));

    t.store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(t.persisted(), Some(cart_of(&[(1, 1)])));
    t.assert_in_sync();
}
