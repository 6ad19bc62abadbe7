//! Public cache façade.
//!
//! [`KvCache`] is the only handle callers hold; the engine, its index, and
//! its worker thread stay private. The handle is deliberately not `Clone`:
//! it owns the worker, and dropping it joins the worker before the index
//! is torn down.

use std::sync::Arc;

use bytes::Bytes;
use warmstart_core::storage::ObjectStore;

use crate::config::CacheConfig;
use crate::engine::{BlockRef, CacheEngine, CacheError, CacheStats, LookupResult};
use crate::metrics::MetricsSnapshot;

/// Shared prefix cache over an object store.
///
/// # Example
///
/// ```no_run
/// use warmstart_cache::{CacheConfig, KvCache};
///
/// # fn main() -> Result<(), warmstart_cache::CacheError> {
/// let mut config = CacheConfig::new("llama-3-8b");
/// config.apply_env_defaults();
/// let cache = KvCache::open(config)?;
///
/// let tokens: Vec<u32> = (0..512).collect();
/// let hit = cache.lookup(&tokens);
/// # Ok(())
/// # }
/// ```
pub struct KvCache {
    engine: CacheEngine,
}

impl KvCache {
    /// Open a cache against the S3 backend described by `config`.
    ///
    /// Empty S3 fields fall back to environment variables and built-in
    /// defaults; see [`CacheConfig::apply_env_defaults`].
    #[cfg(feature = "s3")]
    pub fn open(mut config: CacheConfig) -> Result<Self, CacheError> {
        config.apply_env_defaults();

        let s3 = &config.s3;
        let endpoint = (!s3.endpoint.is_empty()).then_some(s3.endpoint.as_str());
        let credentials = (!s3.access_key_id.is_empty() && !s3.secret_access_key.is_empty())
            .then_some((s3.access_key_id.as_str(), s3.secret_access_key.as_str()));
        let storage = warmstart_core::storage::S3Storage::new(
            &s3.bucket,
            &s3.region,
            endpoint,
            credentials,
            s3.path_style(),
        )?;

        Self::with_store(config, Arc::new(storage))
    }

    /// Open a cache against any object store backend.
    pub fn with_store(
        config: CacheConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            engine: CacheEngine::new(&config, store)?,
        })
    }

    /// Longest cached prefix of `tokens` that can be served intact.
    ///
    /// Pure index read; performs no I/O. Returns zero matched tokens and
    /// no handles when nothing usable is cached.
    pub fn lookup(&self, tokens: &[u32]) -> LookupResult {
        self.engine.lookup(tokens)
    }

    /// Fetch one block's payload.
    ///
    /// Returns `None` when the object store fails; the index is left
    /// untouched so a retry can succeed. Handles race eviction: a load may
    /// fail (or succeed against a just-deleted key) after the block leaves
    /// the index.
    pub fn load(&self, handle: &BlockRef) -> Option<Bytes> {
        self.engine.load(handle)
    }

    /// Store the block ending at `(block_index + 1) * block_size` tokens.
    ///
    /// Returns true iff the object store write succeeded. `tokens` must
    /// cover the whole block prefix, otherwise the call is rejected
    /// without I/O.
    pub fn store(&self, tokens: &[u32], block_index: u32, block: &[u8]) -> bool {
        self.engine.store(tokens, block_index, block)
    }

    /// Bytes currently accounted to resident blocks.
    pub fn used_bytes(&self) -> u64 {
        self.engine.used_bytes()
    }

    /// Soft capacity in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        self.engine.capacity_bytes()
    }

    /// Change the soft capacity; shrinking below used bytes wakes the
    /// eviction worker.
    pub fn set_capacity_bytes(&self, capacity: u64) {
        self.engine.set_capacity_bytes(capacity)
    }

    /// Point-in-time index statistics.
    pub fn stats(&self) -> CacheStats {
        self.engine.stats()
    }

    /// Snapshot of the cache counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.engine.metrics().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warmstart_core::storage::MemoryStorage;

    #[test]
    fn test_facade_roundtrip() {
        let config = CacheConfig::new("m").with_block_size(4).with_capacity_bytes(1024);
        let cache = KvCache::with_store(config, Arc::new(MemoryStorage::new())).unwrap();

        let tokens = [1u32, 2, 3, 4];
        assert!(cache.store(&tokens, 0, b"payload"));

        let hit = cache.lookup(&tokens);
        assert_eq!(hit.matched_tokens, 4);
        assert_eq!(cache.load(&hit.handles[0]).unwrap().as_ref(), b"payload");

        assert_eq!(cache.used_bytes(), 7);
        assert_eq!(cache.capacity_bytes(), 1024);
        assert_eq!(cache.stats().entry_count, 1);
        assert_eq!(cache.metrics().lookup_hits, 1);
    }
}
