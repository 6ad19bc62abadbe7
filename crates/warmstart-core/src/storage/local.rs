//! Local filesystem storage backend.

use super::ObjectStore;
use crate::error::{Result, WarmstartError};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Local filesystem storage backend.
///
/// Keys map to paths under the root; slashes in keys become directories.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.key_to_path(key);
        let data = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WarmstartError::NotFound(key.to_string())
            } else {
                WarmstartError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.key_to_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &data)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_to_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WarmstartError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_storage_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path()).unwrap();

        let key = "test/data.bin";
        let data = Bytes::from_static(b"hello world");

        storage.put(key, data.clone()).unwrap();

        let retrieved = storage.get(key).unwrap();
        assert_eq!(retrieved, data);

        storage.delete(key).unwrap();
        assert!(matches!(
            storage.get(key),
            Err(WarmstartError::NotFound(_))
        ));
    }

    #[test]
    fn test_local_storage_not_found() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path()).unwrap();

        let result = storage.get("nonexistent");
        assert!(matches!(result, Err(WarmstartError::NotFound(_))));
    }

    #[test]
    fn test_local_storage_delete_absent_succeeds() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path()).unwrap();

        storage.delete("never/stored.bin").unwrap();
    }

    #[test]
    fn test_local_storage_overwrite() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path()).unwrap();

        storage.put("k", Bytes::from_static(b"old")).unwrap();
        storage.put("k", Bytes::from_static(b"new")).unwrap();

        assert_eq!(storage.get("k").unwrap(), Bytes::from_static(b"new"));
    }
}
