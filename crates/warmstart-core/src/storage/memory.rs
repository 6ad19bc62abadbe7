//! In-memory storage backend.

use super::ObjectStore;
use crate::error::{Result, WarmstartError};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage backend.
///
/// Holds payloads in a locked map. Used by tests and benchmarks where a
/// real store would only add latency.
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.read_objects().len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.read_objects().is_empty()
    }

    /// Whether an object exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.read_objects().contains_key(key)
    }

    fn read_objects(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Bytes>> {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_objects(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Bytes>> {
        self.objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Bytes> {
        self.read_objects()
            .get(key)
            .cloned()
            .ok_or_else(|| WarmstartError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.write_objects().insert(key.to_string(), data);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.write_objects().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();

        storage.put("a", Bytes::from_static(b"payload")).unwrap();
        assert_eq!(storage.get("a").unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(storage.len(), 1);

        storage.delete("a").unwrap();
        assert!(storage.is_empty());
        assert!(matches!(storage.get("a"), Err(WarmstartError::NotFound(_))));
    }

    #[test]
    fn test_memory_storage_delete_absent_succeeds() {
        let storage = MemoryStorage::new();
        storage.delete("missing").unwrap();
    }
}
