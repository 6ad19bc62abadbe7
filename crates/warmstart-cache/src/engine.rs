//! The cache engine.
//!
//! Owns the in-memory index that maps token prefixes to stored blocks: a
//! prefix high-water-mark map, a block-metadata map, an LRU tracker, and
//! the used-byte counter, all behind one mutex. A single background worker
//! drains least-recently-used blocks from the object store whenever
//! resident bytes exceed the configured capacity.
//!
//! Lookups never touch the object store. Stores and loads block on it
//! outside the index lock, so the critical sections stay short.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, warn};
use warmstart_core::storage::ObjectStore;
use warmstart_core::WarmstartError;

use crate::config::CacheConfig;
use crate::digest::{DigestError, PrefixDigest};
use crate::lru::LruTracker;
use crate::metrics::CacheMetrics;

/// How long the eviction worker sleeps between capacity checks when it is
/// not signaled.
const EVICTION_WAIT: Duration = Duration::from_secs(1);

/// Errors that can occur constructing a cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Digest error
    #[error("Digest error: {0}")]
    Digest(#[from] DigestError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] WarmstartError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to one resident block, resolvable via `load`.
///
/// A handle is a snapshot of the index at lookup time; a concurrent
/// eviction may remove the block before `load` runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRef {
    /// Object store key of the block payload.
    pub object_key: String,
    /// Payload size in bytes at lookup time.
    pub size: u64,
    /// Block index within the prefix (0-based).
    pub index: u32,
}

/// Result of a prefix lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupResult {
    /// Number of leading tokens the cache can serve; always a multiple of
    /// the block size.
    pub matched_tokens: u32,
    /// One handle per matched block, in block order.
    pub handles: Vec<BlockRef>,
}

/// Point-in-time view of the index.
#[derive(Clone, Debug)]
pub struct CacheStats {
    /// Number of resident blocks.
    pub entry_count: usize,
    /// Sum of resident block sizes in bytes.
    pub used_bytes: u64,
    /// Configured soft capacity in bytes.
    pub capacity_bytes: u64,
    /// Used over capacity (0.0 to 1.0, may exceed 1.0 transiently).
    pub utilization: f64,
}

/// Metadata for one resident block.
struct BlockMeta {
    size: u64,
}

/// All index state; guarded by the engine mutex.
struct State {
    lru: LruTracker,
    /// Object key -> metadata. Membership here mirrors the LRU tracker.
    blocks: HashMap<String, BlockMeta>,
    /// Prefix digest (hex) -> highest contiguous block index stored for
    /// that prefix.
    hwm: HashMap<String, u32>,
    used_bytes: u64,
    capacity_bytes: u64,
    stopping: bool,
}

struct EngineInner {
    state: Mutex<State>,
    gc_cv: Condvar,
    store: Arc<dyn ObjectStore>,
    metrics: CacheMetrics,
    model_id: String,
    block_size: u32,
}

impl EngineInner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        // The index is a cache: a panicking writer cannot leave it in a
        // state worse than an evicted entry, so recover from poisoning.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The cache engine. Construct through [`crate::KvCache`].
pub(crate) struct CacheEngine {
    inner: Arc<EngineInner>,
    worker: Option<JoinHandle<()>>,
}

impl CacheEngine {
    pub(crate) fn new(
        config: &CacheConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, CacheError> {
        if config.block_size_tokens == 0 {
            return Err(CacheError::Config(
                "block_size_tokens must be at least 1".to_string(),
            ));
        }
        // Surfaces an over-long model id here instead of on every lookup.
        PrefixDigest::compute(&config.model_id, config.block_size_tokens, &[])?;

        let inner = Arc::new(EngineInner {
            state: Mutex::new(State {
                lru: LruTracker::new(),
                blocks: HashMap::new(),
                hwm: HashMap::new(),
                used_bytes: 0,
                capacity_bytes: config.capacity_bytes,
                stopping: false,
            }),
            gc_cv: Condvar::new(),
            store,
            metrics: CacheMetrics::new(),
            model_id: config.model_id.clone(),
            block_size: config.block_size_tokens,
        });

        let worker_inner = Arc::clone(&inner);
        let worker = std::thread::Builder::new()
            .name("warmstart-evict".to_string())
            .spawn(move || eviction_loop(&worker_inner))?;

        Ok(Self {
            inner,
            worker: Some(worker),
        })
    }

    /// Longest cached prefix of `tokens` the index can serve intact.
    ///
    /// Pure index read; never touches the object store. When metadata for
    /// a block under the high-water mark is missing (evicted since the
    /// mark was advanced), the match is truncated at the gap.
    pub(crate) fn lookup(&self, tokens: &[u32]) -> LookupResult {
        let b = self.inner.block_size;
        let total_blocks = (tokens.len() as u64 / b as u64) as u32;
        if total_blocks == 0 {
            return LookupResult::default();
        }

        // Digests are a pure function of the token slice; compute them all
        // before taking the lock. digests[i] covers blocks 0..=i.
        let digests: Result<Vec<String>, DigestError> = (1..=total_blocks)
            .map(|blocks| {
                PrefixDigest::compute(
                    &self.inner.model_id,
                    b,
                    &tokens[..(blocks as usize) * (b as usize)],
                )
                .map(|d| d.to_hex())
            })
            .collect();
        let digests = match digests {
            Ok(digests) => digests,
            Err(err) => {
                // Unreachable for a validated model id.
                error!(error = %err, "prefix digest failed during lookup");
                return LookupResult::default();
            }
        };

        let state = self.inner.lock_state();
        for blocks in (1..=total_blocks).rev() {
            let k = blocks * b;
            let Some(&hwm) = state.hwm.get(&digests[(blocks - 1) as usize]) else {
                continue;
            };

            let matched = k.min((hwm + 1).saturating_mul(b));
            let mut handles = Vec::with_capacity((matched / b) as usize);
            for i in 0..matched / b {
                let key = object_key(&self.inner.model_id, b, &digests[i as usize], i);
                match state.blocks.get(&key) {
                    Some(meta) => handles.push(BlockRef {
                        object_key: key,
                        size: meta.size,
                        index: i,
                    }),
                    None => {
                        // A block under the mark was evicted; serve the
                        // contiguous run before the gap.
                        drop(state);
                        debug!(expected = matched / b, served = i, "lookup truncated at gap");
                        self.inner.metrics.record_lookup(i > 0);
                        return LookupResult {
                            matched_tokens: i * b,
                            handles,
                        };
                    }
                }
            }
            drop(state);
            self.inner.metrics.record_lookup(true);
            return LookupResult {
                matched_tokens: matched,
                handles,
            };
        }
        drop(state);

        self.inner.metrics.record_lookup(false);
        LookupResult::default()
    }

    /// Write one block to the object store and index it.
    ///
    /// Returns false without touching the store when `tokens` does not
    /// cover the block, and without touching the index when the store
    /// write fails.
    pub(crate) fn store(&self, tokens: &[u32], block_index: u32, block: &[u8]) -> bool {
        let b = self.inner.block_size;
        let Some(prefix_blocks) = block_index.checked_add(1) else {
            return false;
        };
        let prefix_len = prefix_blocks as u64 * b as u64;
        if (tokens.len() as u64) < prefix_len {
            debug!(
                tokens = tokens.len(),
                block_index, "store rejected: token slice shorter than block prefix"
            );
            return false;
        }

        let prefix = &tokens[..prefix_len as usize];
        let digest_hex = match PrefixDigest::compute(&self.inner.model_id, b, prefix) {
            Ok(digest) => digest.to_hex(),
            Err(err) => {
                error!(error = %err, "prefix digest failed during store");
                return false;
            }
        };
        let key = object_key(&self.inner.model_id, b, &digest_hex, block_index);

        if let Err(err) = self
            .inner
            .store
            .put(&key, Bytes::copy_from_slice(block))
        {
            warn!(key = %key, error = %err, "object store put failed");
            return false;
        }

        // The high-water mark only advances when this block contiguously
        // extends its predecessor prefix; that check needs the
        // predecessor's digest, computed before locking.
        let pred_hex = if block_index == 0 {
            None
        } else {
            PrefixDigest::compute(
                &self.inner.model_id,
                b,
                &tokens[..(block_index as usize) * (b as usize)],
            )
            .ok()
            .map(|d| d.to_hex())
        };

        let size = block.len() as u64;
        let mut state = self.inner.lock_state();

        if let Some(old) = state.blocks.insert(key.clone(), BlockMeta { size }) {
            state.used_bytes = state.used_bytes - old.size + size;
        } else {
            state.used_bytes += size;
        }
        state.lru.touch(&key);

        match pred_hex {
            None => {
                state.hwm.entry(digest_hex).or_insert(0);
            }
            Some(pred_hex) => {
                if state.hwm.get(&pred_hex).copied() == Some(block_index - 1) {
                    state.hwm.insert(digest_hex, block_index);
                }
            }
        }

        if state.used_bytes > state.capacity_bytes {
            self.inner.gc_cv.notify_one();
        }
        drop(state);

        self.inner.metrics.record_store(size);
        debug!(key = %key, bytes = size, "stored block");
        true
    }

    /// Fetch a block's payload from the object store.
    ///
    /// Returns `None` on store failure, leaving the index untouched: the
    /// block may still exist and recover on retry. A load can race with
    /// eviction; the bytes are still returned, but an evicted key is never
    /// re-inserted into the LRU.
    pub(crate) fn load(&self, handle: &BlockRef) -> Option<Bytes> {
        let data = match self.inner.store.get(&handle.object_key) {
            Ok(data) => data,
            Err(err) => {
                warn!(key = %handle.object_key, error = %err, "object store get failed");
                return None;
            }
        };

        let mut state = self.inner.lock_state();
        if state.blocks.contains_key(&handle.object_key) {
            state.lru.touch(&handle.object_key);
        }
        drop(state);

        self.inner.metrics.record_load(data.len() as u64);
        Some(data)
    }

    pub(crate) fn used_bytes(&self) -> u64 {
        self.inner.lock_state().used_bytes
    }

    pub(crate) fn capacity_bytes(&self) -> u64 {
        self.inner.lock_state().capacity_bytes
    }

    pub(crate) fn set_capacity_bytes(&self, capacity: u64) {
        let mut state = self.inner.lock_state();
        state.capacity_bytes = capacity;
        if state.used_bytes > state.capacity_bytes {
            self.inner.gc_cv.notify_one();
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        let state = self.inner.lock_state();
        CacheStats {
            entry_count: state.blocks.len(),
            used_bytes: state.used_bytes,
            capacity_bytes: state.capacity_bytes,
            utilization: if state.capacity_bytes > 0 {
                state.used_bytes as f64 / state.capacity_bytes as f64
            } else {
                0.0
            },
        }
    }

    pub(crate) fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }
}

impl Drop for CacheEngine {
    fn drop(&mut self) {
        {
            let mut state = self.inner.lock_state();
            state.stopping = true;
        }
        self.inner.gc_cv.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Object key of block `block_index` under a prefix digest.
///
/// The format is wire-visible; workers on other machines derive the same
/// key from the same prefix.
fn object_key(model_id: &str, block_size: u32, digest_hex: &str, block_index: u32) -> String {
    format!("{model_id}/b{block_size}/{digest_hex}/{block_index}.kv")
}

/// Body of the eviction worker thread.
///
/// Waits for a capacity signal (or the 1-second poll interval), then
/// drains LRU tails until used bytes fit the budget. Each victim is
/// removed from the index under the lock; the delete itself runs with the
/// lock released so readers never wait on the store, and the lock is
/// reacquired before the next victim. A key can therefore linger at the
/// store briefly after leaving the index; a failed delete leaves an
/// orphan, which the store tolerates.
fn eviction_loop(inner: &EngineInner) {
    loop {
        let guard = inner.lock_state();
        let (mut state, _timeout) = inner
            .gc_cv
            .wait_timeout_while(guard, EVICTION_WAIT, |s| {
                !s.stopping && s.used_bytes <= s.capacity_bytes
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.stopping {
            return;
        }

        while state.used_bytes > state.capacity_bytes {
            let Some(key) = state.lru.evict_lru() else {
                break;
            };
            let Some(meta) = state.blocks.remove(&key) else {
                // Tracker and metadata map are updated together; a missing
                // entry here means that invariant broke.
                error!(key = %key, "evicted key had no metadata entry");
                continue;
            };
            state.used_bytes -= meta.size;
            inner.metrics.record_eviction(meta.size);
            debug!(key = %key, bytes = meta.size, "evicting block");

            drop(state);
            if let Err(err) = inner.store.delete(&key) {
                warn!(key = %key, error = %err, "delete after eviction failed, orphan left at store");
            }
            state = inner.lock_state();
            if state.stopping {
                return;
            }
        }
    }
}
