//! Cart operation errors and their user-facing messages.
//!
//! Every failed cart operation produces a `CartError` and leaves both the
//! in-memory cart and the persisted snapshot exactly as they were. The store
//! also reports [`CartError::user_message`] to the notifier, so callers that
//! ignore the returned error still surface the failure to the user.

use cartsync_core::{CartInvariantError, ProductId};
use thiserror::Error;

use crate::catalog::CollaboratorError;
use crate::snapshot::SnapshotError;

/// Message reported whenever a requested amount does not fit the stock.
pub const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// The cart operation that failed, used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddProduct,
    RemoveProduct,
    UpdateAmount,
}

impl Operation {
    /// Generic failure message for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::AddProduct => "Failed to add product",
            Self::RemoveProduct => "Failed to remove product",
            Self::UpdateAmount => "Failed to update product quantity",
        }
    }
}

/// Error type for cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested amount is below one or above the reported stock.
    #[error("requested {requested} of product {product_id}, {available} available")]
    StockUnavailable {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// Catalog or stock lookup failed.
    #[error("collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// The snapshot write failed, so nothing was published.
    #[error("snapshot write failed: {0}")]
    Persistence(#[from] SnapshotError),

    /// Computing the next cart broke a structural invariant.
    #[error("cart invariant violated: {0}")]
    Invariant(CartInvariantError),
}

impl From<CartInvariantError> for CartError {
    fn from(err: CartInvariantError) -> Self {
        match err {
            CartInvariantError::LineNotFound(id) => Self::LineNotFound(id),
            other => Self::Invariant(other),
        }
    }
}

impl CartError {
    /// The message reported to the user when `operation` fails with this error.
    #[must_use]
    pub const fn user_message(&self, operation: Operation) -> &'static str {
        match self {
            Self::StockUnavailable { .. } => OUT_OF_STOCK_MESSAGE,
            _ => operation.failure_message(),
        }
    }

    #[must_use]
    pub const fn is_stock_unavailable(&self) -> bool {
        matches!(self, Self::StockUnavailable { .. })
    }

    #[must_use]
    pub const fn is_line_not_found(&self) -> bool {
        matches!(self, Self::LineNotFound(_))
    }

    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::StockUnavailable {
            product_id: ProductId::new(2),
            requested: 7,
            available: 5,
        };
        assert_eq!(err.to_string(), "requested 7 of product 2, 5 available");

        let err = CartError::LineNotFound(ProductId::new(3));
        assert_eq!(err.to_string(), "product 3 is not in the cart");
    }

    #[test]
    fn test_stock_message_wins_for_every_operation() {
        let err = CartError::StockUnavailable {
            product_id: ProductId::new(1),
            requested: 2,
            available: 1,
        };
        for op in [
            Operation::AddProduct,
            Operation::RemoveProduct,
            Operation::UpdateAmount,
        ] {
            assert_eq!(err.user_message(op), OUT_OF_STOCK_MESSAGE);
        }
    }

    #[test]
    fn test_other_errors_use_operation_message() {
        let err = CartError::LineNotFound(ProductId::new(1));
        assert_eq!(
            err.user_message(Operation::RemoveProduct),
            "Failed to remove product"
        );
        assert_eq!(
            err.user_message(Operation::UpdateAmount),
            "Failed to update product quantity"
        );

        let err = CartError::Collaborator(CollaboratorError::NotFound(ProductId::new(9)));
        assert_eq!(err.user_message(Operation::AddProduct), "Failed to add product");
    }

    #[test]
    fn test_invariant_line_not_found_maps_to_line_not_found() {
        let err = CartError::from(CartInvariantError::LineNotFound(ProductId::new(4)));
        assert!(err.is_line_not_found());

        let err = CartError::from(CartInvariantError::DuplicateLine(ProductId::new(4)));
        assert!(matches!(err, CartError::Invariant(_)));
    }
}
