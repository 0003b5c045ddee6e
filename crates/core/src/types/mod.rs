//! Core types for cartsync.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartDecodeError, CartInvariantError, CartLine};
pub use id::*;
pub use price::Price;
pub use product::{Product, StockLevel};
