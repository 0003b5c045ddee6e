//! cartsync Core - Shared cart types.
//!
//! This crate provides the types shared by every cartsync component:
//! - `cartsync` - The cart store and its collaborators
//! - `cartsync-cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure transformations - no I/O, no
//! HTTP clients, no persistence. A [`Cart`] is never mutated in place; every
//! change produces a new value that the store persists before publishing.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, product and stock records, cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
