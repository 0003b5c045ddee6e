//! Key-value storage for the persisted cart.
//!
//! Stores are synchronous. A cart commit writes the snapshot and publishes
//! the new state without yielding in between.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use std::path::PathBuf;

use thiserror::Error;

/// Default key the cart is persisted under.
pub const DEFAULT_SNAPSHOT_KEY: &str = "@RocketShoes:cart";

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cart could not be encoded.
    #[error("failed to encode cart: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Synchronous key-value store holding serialized carts.
pub trait SnapshotStore: Send + Sync {
    /// Read the value stored under `key`, `Ok(None)` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, SnapshotError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value was not stored. The previous value must
    /// then still be readable.
    fn write(&self, key: &str, value: &str) -> Result<(), SnapshotError>;
}
