//! Product and stock records as reported by the catalog API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A product record from the catalog.
///
/// Attributes the cart does not interpret are kept in `extra` so they survive
/// a trip through the persisted snapshot unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra attributes.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price, image: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            extra: Map::new(),
        }
    }
}

/// Available quantity for a product.
///
/// The stock API may omit `amount`; a missing amount is read as "nothing
/// available", the same as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub id: ProductId,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl StockLevel {
    /// Create a stock level with a known amount.
    #[must_use]
    pub const fn new(id: ProductId, amount: i64) -> Self {
        Self {
            id,
            amount: Some(amount),
        }
    }

    /// Units that may be put in a cart. Negative and missing amounts are 0.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.amount
            .map_or(0, |amount| u32::try_from(amount.max(0)).unwrap_or(u32::MAX))
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.available() > 0
    }

    /// Whether `requested` units fit within the available stock.
    #[must_use]
    pub fn allows(&self, requested: u32) -> bool {
        requested >= 1 && requested <= self.available()
    }
}
