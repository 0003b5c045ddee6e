//! The cart store.
//!
//! `CartStore` owns the session's cart and is the only way to change it.
//! Every mutation runs under a single writer lock and follows the same
//! sequence: read the current cart, consult the stock source (and catalog),
//! compute the next cart, write the snapshot, publish. A failure at any step
//! abandons the mutation before the snapshot write, so the persisted and
//! in-memory copies always agree.

use std::sync::Arc;

use cartsync_core::{Cart, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::catalog::{Catalog, CollaboratorError, StockSource};
use crate::error::{CartError, Operation, Result};
use crate::notify::Notifier;
use crate::snapshot::{DEFAULT_SNAPSHOT_KEY, SnapshotError, SnapshotStore};

/// Arguments for [`CartStore::update_product_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: u32,
}

/// The external systems a [`CartStore`] depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub stock: Arc<dyn StockSource>,
    pub snapshot: Arc<dyn SnapshotStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Use one value as both catalog and stock source.
    pub fn shared<C>(
        catalog: Arc<C>,
        snapshot: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self
    where
        C: Catalog + StockSource + 'static,
    {
        Self {
            catalog: catalog.clone(),
            stock: catalog,
            snapshot,
            notifier,
        }
    }
}

/// Shared handle to the session cart.
///
/// Cheap to clone; clones operate on the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    collaborators: Collaborators,
    key: String,
    /// Serializes read-modify-persist-publish sequences.
    writer: Mutex<()>,
    state: watch::Sender<Cart>,
}

impl CartStore {
    /// Open the store under the default snapshot key.
    #[must_use]
    pub fn open(collaborators: Collaborators) -> Self {
        Self::open_with_key(collaborators, DEFAULT_SNAPSHOT_KEY)
    }

    /// Open the store, restoring the cart persisted under `key`.
    ///
    /// A missing snapshot yields an empty cart. An unreadable or invalid one
    /// is logged and also yields an empty cart; it is overwritten by the next
    /// successful mutation.
    #[must_use]
    pub fn open_with_key(collaborators: Collaborators, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = restore(collaborators.snapshot.as_ref(), &key);
        let (state, _) = watch::channel(cart);

        Self {
            inner: Arc::new(CartStoreInner {
                collaborators,
                key,
                writer: Mutex::new(()),
                state,
            }),
        }
    }

    /// The snapshot key this store persists under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The last published cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to published carts. The receiver starts at the current cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// Add one unit of `product_id`.
    ///
    /// A product not yet in the cart is appended with amount 1 if it is in
    /// stock. A product already in the cart is re-quantified to its amount
    /// plus one, with the same checks and messages as
    /// [`CartStore::update_product_amount`].
    ///
    /// # Errors
    ///
    /// `StockUnavailable` if no unit is available, `Collaborator` if a
    /// lookup failed, `Persistence` if the snapshot write failed. The error
    /// has already been reported to the notifier.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<()> {
        let _writer = self.inner.writer.lock().await;
        let current = self.cart();

        if let Some(line) = current.line(product_id) {
            let amount = line.amount.saturating_add(1);
            debug!(amount, "Product already in cart, incrementing");
            let result = self.set_amount(&current, product_id, amount).await;
            return self.report(Operation::UpdateAmount, result);
        }

        let result = self.append(&current, product_id).await;
        self.report(Operation::AddProduct, result)
    }

    /// Remove the line for `product_id`.
    ///
    /// Not idempotent: removing a product that is not in the cart fails.
    ///
    /// # Errors
    ///
    /// `LineNotFound` if the product has no line, `Persistence` if the
    /// snapshot write failed. The error has already been reported to the
    /// notifier.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<()> {
        let _writer = self.inner.writer.lock().await;
        let current = self.cart();

        let result = current
            .without(product_id)
            .map_err(CartError::from)
            .and_then(|next| self.commit(next));
        self.report(Operation::RemoveProduct, result)
    }

    /// Set the amount of an existing line, bounded by the reported stock.
    ///
    /// An amount of zero is rejected; use [`CartStore::remove_product`].
    ///
    /// # Errors
    ///
    /// `LineNotFound` if the product has no line, `StockUnavailable` if the
    /// amount is zero or above the stock, `Collaborator` if the stock lookup
    /// failed, `Persistence` if the snapshot write failed. The error has
    /// already been reported to the notifier.
    #[instrument(skip(self, update), fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn update_product_amount(&self, update: UpdateProductAmount) -> Result<()> {
        let _writer = self.inner.writer.lock().await;
        let current = self.cart();

        let result = self
            .set_amount(&current, update.product_id, update.amount)
            .await;
        self.report(Operation::UpdateAmount, result)
    }

    async fn append(&self, current: &Cart, product_id: ProductId) -> Result<()> {
        let stock = self.inner.collaborators.stock.stock(product_id).await?;
        if !stock.in_stock() {
            return Err(CartError::StockUnavailable {
                product_id,
                requested: 1,
                available: stock.available(),
            });
        }

        let product = self.inner.collaborators.catalog.product(product_id).await?;
        if product.id != product_id {
            return Err(CollaboratorError::Malformed(
                product_id,
                format!("catalog returned product {}", product.id),
            )
            .into());
        }

        let next = current.with_added(product)?;
        self.commit(next)
    }

    async fn set_amount(&self, current: &Cart, product_id: ProductId, amount: u32) -> Result<()> {
        if !current.contains(product_id) {
            return Err(CartError::LineNotFound(product_id));
        }

        let stock = self.inner.collaborators.stock.stock(product_id).await?;
        if !stock.allows(amount) {
            return Err(CartError::StockUnavailable {
                product_id,
                requested: amount,
                available: stock.available(),
            });
        }

        let next = current.with_amount(product_id, amount)?;
        self.commit(next)
    }

    /// Persist `next`, then publish it. Nothing is published if the write fails.
    fn commit(&self, next: Cart) -> Result<()> {
        let json = next.to_json().map_err(SnapshotError::Serialize)?;
        self.inner
            .collaborators
            .snapshot
            .write(&self.inner.key, &json)?;

        info!(
            lines = next.len(),
            items = next.total_items(),
            "Cart committed"
        );
        self.inner.state.send_replace(next);
        Ok(())
    }

    fn report(&self, operation: Operation, result: Result<()>) -> Result<()> {
        if let Err(err) = &result {
            warn!(?operation, error = %err, "Cart operation failed");
            self.inner
                .collaborators
                .notifier
                .report_error(err.user_message(operation));
        }
        result
    }
}

fn restore(snapshot: &dyn SnapshotStore, key: &str) -> Cart {
    match snapshot.read(key) {
        Ok(Some(json)) => match Cart::from_json(&json) {
            Ok(cart) => {
                info!(key, lines = cart.len(), "Restored cart from snapshot");
                cart
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding invalid cart snapshot");
                Cart::new()
            }
        },
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(key, error = %e, "Failed to read cart snapshot, starting empty");
            Cart::new()
        }
    }
}
