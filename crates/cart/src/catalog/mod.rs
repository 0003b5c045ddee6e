//! Product and stock lookups.
//!
//! # Architecture
//!
//! - [`Catalog`] returns product records, [`StockSource`] returns available
//!   quantities. The cart store only ever reads from them.
//! - [`ApiClient`] implements both against a json-server style REST API
//!   (`GET /products/{id}`, `GET /stock/{id}`). Product records are cached
//!   via `moka`; stock is always fetched fresh.
//! - [`FixtureCatalog`] implements both from memory, optionally loaded from
//!   the API's `db.json`, for offline use and tests.

mod fixture;
mod http;

pub use fixture::FixtureCatalog;
pub use http::{ApiClient, ApiError};

use async_trait::async_trait;
use cartsync_core::{Product, ProductId, StockLevel};
use thiserror::Error;

/// Errors returned by catalog and stock lookups.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// No record exists for the product.
    #[error("no record for product {0}")]
    NotFound(ProductId),

    /// The record exists but cannot be used.
    #[error("malformed record for product {0}: {1}")]
    Malformed(ProductId, String),

    /// The HTTP API failed.
    #[error("catalog API error: {0}")]
    Api(#[from] ApiError),

    /// The collaborator is unreachable for another reason.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Source of product records.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the record for `id`.
    async fn product(&self, id: ProductId) -> Result<Product, CollaboratorError>;
}

/// Source of current stock levels.
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Fetch the available quantity for `id`.
    ///
    /// A record whose amount is missing is returned as-is; it is up to the
    /// caller to treat it as out of stock.
    async fn stock(&self, id: ProductId) -> Result<StockLevel, CollaboratorError>;
}
