//! Cart commands.
//!
//! Each mutating command runs one store operation; the caller prints the
//! resulting cart afterwards. Failure messages reach the user through the
//! store's notifier (a `WARN` event), the returned error only decides the
//! exit code.

use std::path::Path;
use std::sync::Arc;

use cartsync::{
    ApiClient, ApiError, CartConfig, CartError, CartStore, Collaborators, FileSnapshotStore,
    FixtureCatalog, ProductId, TracingNotifier, UpdateProductAmount,
};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The API client could not be built.
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// The fixture file could not be loaded.
    #[error("Failed to load fixture {path}: {reason}")]
    Fixture { path: String, reason: String },

    /// The cart operation failed.
    #[error("{0}")]
    Cart(#[from] CartError),
}

/// Open the cart store described by `config`.
///
/// With `fixture`, products and stock come from that `db.json`; otherwise
/// from the configured API.
///
/// # Errors
///
/// Returns an error if the fixture cannot be loaded or the API client
/// cannot be built.
pub fn open_store(config: &CartConfig, fixture: Option<&Path>) -> Result<CartStore, CommandError> {
    let snapshot = Arc::new(FileSnapshotStore::new(&config.snapshot.dir));
    let notifier = Arc::new(TracingNotifier);

    let collaborators = if let Some(path) = fixture {
        let catalog = FixtureCatalog::load(path).map_err(|e| CommandError::Fixture {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), "Using fixture catalog");
        Collaborators::shared(Arc::new(catalog), snapshot, notifier)
    } else {
        let api = ApiClient::new(&config.api)?;
        info!(base_url = %api.base_url(), "Using catalog API");
        Collaborators::shared(Arc::new(api), snapshot, notifier)
    };

    Ok(CartStore::open_with_key(collaborators, &config.snapshot.key))
}

pub async fn add(store: &CartStore, product_id: ProductId) -> Result<(), CommandError> {
    store.add_product(product_id).await?;
    Ok(())
}

pub async fn remove(store: &CartStore, product_id: ProductId) -> Result<(), CommandError> {
    store.remove_product(product_id).await?;
    Ok(())
}

pub async fn update(store: &CartStore, product_id: ProductId, amount: u32) -> Result<(), CommandError> {
    store
        .update_product_amount(UpdateProductAmount { product_id, amount })
        .await?;
    Ok(())
}

/// Log the current cart, one line per product, then the totals.
pub fn show(store: &CartStore) {
    let cart = store.cart();

    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for line in &cart {
        info!(
            "  #{} {} x{} @ {} = {}",
            line.product_id(),
            line.product.title,
            line.amount,
            line.product.price,
            line.subtotal()
        );
    }
    info!("  {} item(s), subtotal {}", cart.total_items(), cart.subtotal());
}
