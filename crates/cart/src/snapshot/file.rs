//! Directory-backed snapshot store, one file per key.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{SnapshotError, SnapshotStore};

/// Snapshot store that keeps each key in `<dir>/<sanitized key>.json`.
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::io(path, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|e| SnapshotError::io(&self.dir, e))?;

        // Write to temp file, then atomic rename
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value.as_bytes()).map_err(|e| SnapshotError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| SnapshotError::io(&path, e))?;

        debug!(path = %path.display(), bytes = value.len(), "Wrote cart snapshot");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_sanitizes_key() {
        let store = FileSnapshotStore::new("/tmp/carts");
        assert_eq!(
            store.path_for("@RocketShoes:cart"),
            PathBuf::from("/tmp/carts/_RocketShoes_cart.json")
        );
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(store.read("absent").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested"));

        store.write("@RocketShoes:cart", "[]").unwrap();
        store.write("@RocketShoes:cart", r#"[{"id":1}]"#).unwrap();

        assert_eq!(
            store.read("@RocketShoes:cart").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert!(!store.path_for("@RocketShoes:cart").with_extension("json.tmp").exists());
    }
}
