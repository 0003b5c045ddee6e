//! In-memory catalog and stock source.
//!
//! Loads the same `db.json` document the REST API serves
//! (`{"products": [...], "stock": [...]}`), so the CLI can run offline and
//! tests can script catalog behavior, including failures and latency.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cartsync_core::{Product, ProductId, StockLevel};
use serde::Deserialize;

use super::{Catalog, CollaboratorError, StockSource};

#[derive(Debug, Default, Deserialize)]
struct DbDocument {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    stock: Vec<StockLevel>,
}

#[derive(Debug, Default)]
struct FixtureState {
    products: HashMap<ProductId, Product>,
    stock: HashMap<ProductId, StockLevel>,
    failing_products: HashSet<ProductId>,
    failing_stock: HashSet<ProductId>,
}

/// Catalog and stock source backed by in-memory maps.
#[derive(Debug, Default)]
pub struct FixtureCatalog {
    state: Mutex<FixtureState>,
    latency: Option<Duration>,
    product_calls: AtomicUsize,
    stock_calls: AtomicUsize,
}

impl FixtureCatalog {
    /// An empty fixture: every lookup is `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a json-server `db.json` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON of that shape.
    pub fn from_db_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: DbDocument = serde_json::from_str(json)?;
        let fixture = Self::new();
        {
            let mut state = fixture.lock();
            state.products = doc.products.into_iter().map(|p| (p.id, p)).collect();
            state.stock = doc.stock.into_iter().map(|s| (s.id, s)).collect();
        }
        Ok(fixture)
    }

    /// Read and parse a `db.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_db_json(&json)?)
    }

    /// Add a product with the given stock amount.
    #[must_use]
    pub fn with_product(self, product: Product, stock: i64) -> Self {
        self.insert_product(product.clone());
        self.set_stock(product.id, stock);
        self
    }

    /// Delay every lookup by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert_product(&self, product: Product) {
        self.lock().products.insert(product.id, product);
    }

    pub fn set_stock(&self, id: ProductId, amount: i64) {
        self.lock().stock.insert(id, StockLevel::new(id, amount));
    }

    /// Keep the stock record but drop its amount.
    pub fn clear_stock_amount(&self, id: ProductId) {
        self.lock()
            .stock
            .insert(id, StockLevel { id, amount: None });
    }

    pub fn remove_stock_record(&self, id: ProductId) {
        self.lock().stock.remove(&id);
    }

    /// Make product lookups for `id` fail until [`FixtureCatalog::recover`].
    pub fn fail_products(&self, id: ProductId) {
        self.lock().failing_products.insert(id);
    }

    /// Make stock lookups for `id` fail until [`FixtureCatalog::recover`].
    pub fn fail_stock(&self, id: ProductId) {
        self.lock().failing_stock.insert(id);
    }

    /// Clear every injected failure.
    pub fn recover(&self) {
        let mut state = self.lock();
        state.failing_products.clear();
        state.failing_stock.clear();
    }

    /// Number of product lookups served so far.
    #[must_use]
    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    /// Number of stock lookups served so far.
    #[must_use]
    pub fn stock_calls(&self) -> usize {
        self.stock_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, CollaboratorError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let state = self.lock();
        if state.failing_products.contains(&id) {
            return Err(CollaboratorError::Unavailable(format!(
                "product lookup for {id} failed"
            )));
        }
        state
            .products
            .get(&id)
            .cloned()
            .ok_or(CollaboratorError::NotFound(id))
    }
}

#[async_trait]
impl StockSource for FixtureCatalog {
    async fn stock(&self, id: ProductId) -> Result<StockLevel, CollaboratorError> {
        self.stock_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let state = self.lock();
        if state.failing_stock.contains(&id) {
            return Err(CollaboratorError::Unavailable(format!(
                "stock lookup for {id} failed"
            )));
        }
        state
            .stock
            .get(&id)
            .copied()
            .ok_or(CollaboratorError::NotFound(id))
    }
}
