//! cartsync - a shopping cart kept in sync with a persisted snapshot and
//! externally reported stock.
//!
//! # Architecture
//!
//! - [`CartStore`] is the single owner of the session cart. It exposes the
//!   current cart, a watch channel of published carts, and three mutations:
//!   [`CartStore::add_product`], [`CartStore::remove_product`] and
//!   [`CartStore::update_product_amount`].
//! - A mutation either commits (snapshot written, then new cart published) or
//!   fails with a [`CartError`] that is also reported to the [`Notifier`].
//!   It never leaves the two copies disagreeing.
//! - Collaborators are traits: [`Catalog`], [`StockSource`],
//!   [`SnapshotStore`], [`Notifier`]. [`ApiClient`] talks to the REST API,
//!   [`FixtureCatalog`] serves a local `db.json`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cartsync::{ApiClient, CartConfig, CartStore, Collaborators, FileSnapshotStore, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let api = Arc::new(ApiClient::new(&config.api)?);
//! let store = CartStore::open_with_key(
//!     Collaborators::shared(
//!         api,
//!         Arc::new(FileSnapshotStore::new(&config.snapshot.dir)),
//!         Arc::new(TracingNotifier),
//!     ),
//!     &config.snapshot.key,
//! );
//!
//! store.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod snapshot;
pub mod store;

pub use catalog::{ApiClient, ApiError, Catalog, CollaboratorError, FixtureCatalog, StockSource};
pub use config::{ApiConfig, CartConfig, ConfigError, SnapshotConfig};
pub use error::{CartError, OUT_OF_STOCK_MESSAGE, Operation};
pub use notify::{MemoryNotifier, Notifier, TracingNotifier};
pub use snapshot::{
    DEFAULT_SNAPSHOT_KEY, FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore,
};
pub use store::{CartStore, Collaborators, UpdateProductAmount};

pub use cartsync_core::{Cart, CartLine, Price, Product, ProductId, StockLevel};
