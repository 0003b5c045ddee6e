//! Cart lines and the pure transformations applied to them.
//!
//! Every transformation returns a new [`Cart`] and leaves the receiver
//! untouched, so a caller can compute the next state, persist it, and only
//! then replace the old one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// A violation of the cart's structural invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    /// A second line for a product already in the cart.
    #[error("product {0} is already in the cart")]
    DuplicateLine(ProductId),

    /// A line with an amount of zero.
    #[error("product {0} has an amount of zero")]
    ZeroAmount(ProductId),

    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),
}

/// Errors decoding a persisted cart.
#[derive(Debug, Error)]
pub enum CartDecodeError {
    #[error("malformed cart JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid cart: {0}")]
    Invariant(#[from] CartInvariantError),
}

/// One product entry in the cart with its quantity.
///
/// Serialized flat, i.e. the product attributes plus an `amount` field.
/// Build lines with [`CartLine::new`] so a catalog attribute named `amount`
/// never shadows the line's own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartLine {
    /// The line's amount replaces any `amount` attribute the catalog sent.
    #[must_use]
    pub fn new(mut product: Product, amount: u32) -> Self {
        product.extra.remove("amount");
        Self { product, amount }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price.times(self.amount)
    }
}

/// An ordered list of cart lines with at most one line per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from lines, checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate product or zero amount found.
    pub fn from_lines(lines: Vec<CartLine>) -> Result<Self, CartInvariantError> {
        let cart = Self { lines };
        cart.validate()?;
        Ok(cart)
    }

    /// Decode a persisted cart and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns `CartDecodeError` if the JSON is malformed or the decoded cart
    /// holds duplicate products or zero amounts.
    pub fn from_json(json: &str) -> Result<Self, CartDecodeError> {
        let lines: Vec<CartLine> = serde_json::from_str(json)?;
        Ok(Self::from_lines(lines)?)
    }

    /// Encode the cart as a JSON array of lines.
    ///
    /// # Errors
    ///
    /// Returns an error if a product's extra attributes cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.lines)
    }

    /// Check that no product appears twice and no amount is zero.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in line order.
    pub fn validate(&self) -> Result<(), CartInvariantError> {
        for (i, line) in self.lines.iter().enumerate() {
            if line.amount == 0 {
                return Err(CartInvariantError::ZeroAmount(line.product_id()));
            }
            if self
                .lines
                .iter()
                .take(i)
                .any(|earlier| earlier.product_id() == line.product_id())
            {
                return Err(CartInvariantError::DuplicateLine(line.product_id()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartLine> {
        self.lines.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.line(id).is_some()
    }

    /// Product ids in cart order.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.lines.iter().map(CartLine::product_id)
    }

    /// Sum of all line amounts.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.amount)).sum()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// A copy of this cart with one unit of `product` appended at the end.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateLine` if the product already has a line.
    pub fn with_added(&self, product: Product) -> Result<Self, CartInvariantError> {
        if self.contains(product.id) {
            return Err(CartInvariantError::DuplicateLine(product.id));
        }
        let mut lines = self.lines.clone();
        lines.push(CartLine::new(product, 1));
        Ok(Self { lines })
    }

    /// A copy of this cart with the amount of `id` replaced.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if `id` has no line, or `ZeroAmount` if `amount`
    /// is zero (lines are removed with [`Cart::without`] instead).
    pub fn with_amount(&self, id: ProductId, amount: u32) -> Result<Self, CartInvariantError> {
        if !self.contains(id) {
            return Err(CartInvariantError::LineNotFound(id));
        }
        if amount == 0 {
            return Err(CartInvariantError::ZeroAmount(id));
        }
        let lines = self
            .lines
            .iter()
            .map(|line| {
                if line.product_id() == id {
                    CartLine::new(line.product.clone(), amount)
                } else {
                    line.clone()
                }
            })
            .collect();
        Ok(Self { lines })
    }

    /// A copy of this cart without the line for `id`.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if `id` has no line.
    pub fn without(&self, id: ProductId) -> Result<Self, CartInvariantError> {
        if !self.contains(id) {
            return Err(CartInvariantError::LineNotFound(id));
        }
        let lines = self
            .lines
            .iter()
            .filter(|line| line.product_id() != id)
            .cloned()
            .collect();
        Ok(Self { lines })
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
