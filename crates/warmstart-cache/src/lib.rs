//! # warmstart-cache
//!
//! Shared prefix cache for LLM key/value tensors.
//!
//! For a decoder serving many requests, the attention state of a prompt's
//! leading tokens is identical whenever the tokens are identical. This
//! crate stores that state, chunked into fixed-size token blocks, on an
//! object store keyed by a content digest of the exact prefix, and serves
//! it back to any worker that presents a matching prefix.
//!
//! ## Quick Start
//!
//! ```no_run
//! use warmstart_cache::{CacheConfig, KvCache};
//!
//! # fn main() -> Result<(), warmstart_cache::CacheError> {
//! let mut config = CacheConfig::new("llama-3-8b").with_block_size(256);
//! config.apply_env_defaults();
//!
//! let cache = KvCache::open(config)?;
//!
//! let tokens: Vec<u32> = (0..512).collect();
//! let hit = cache.lookup(&tokens);
//! for handle in &hit.handles {
//!     let _bytes = cache.load(handle);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        CACHE ENGINE                            │
//! │                                                                │
//! │  lookup ──▶ ┌───────────────────────────┐                     │
//! │             │  in-memory index (mutex)   │    ┌─────────────┐ │
//! │  store ───▶ │  prefix HWM map            │    │ object store│ │
//! │             │  block metadata map        │    │  (S3/MinIO) │ │
//! │  load ────▶ │  LRU tracker · used bytes  │    └─────────────┘ │
//! │             └────────────┬──────────────┘          ▲          │
//! │                          │ over capacity            │ delete  │
//! │                          ▼                          │         │
//! │                ┌──────────────────┐                 │         │
//! │                │ eviction worker  │─────────────────┘         │
//! │                └──────────────────┘                           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups are pure index reads; stores and loads block on the object
//! store outside the index lock; a single background worker drains
//! least-recently-used blocks whenever resident bytes exceed the budget.
//!
//! ## Modules
//!
//! - [`digest`]: content digest of token prefixes
//! - [`lru`]: recency ordering for resident blocks
//! - [`engine`]: the cache engine and eviction worker
//! - [`api`]: the public [`KvCache`] façade
//! - [`config`]: configuration with environment defaulting
//! - [`metrics`]: lock-free cache counters

pub mod api;
pub mod config;
pub mod digest;
pub mod engine;
pub mod lru;
pub mod metrics;

// Re-export commonly used types
pub use api::KvCache;
pub use config::{CacheConfig, S3Config};
pub use digest::{DigestError, PrefixDigest};
pub use engine::{BlockRef, CacheError, CacheStats, LookupResult};
pub use lru::LruTracker;
pub use metrics::{CacheMetrics, MetricsSnapshot};
