//! Cache metrics collection.
//!
//! Lock-free counters recorded by the engine on every lookup, load,
//! store, and eviction. Export as a snapshot or Prometheus text.
//!
//! ## Example
//!
//! ```rust
//! use warmstart_cache::metrics::CacheMetrics;
//!
//! let metrics = CacheMetrics::new();
//! metrics.record_lookup(true);
//! metrics.record_store(1024);
//!
//! println!("{}", metrics.export_prometheus());
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe cache metrics collector.
///
/// All counters use relaxed atomics; totals are exact, cross-counter
/// consistency is best-effort.
#[derive(Debug)]
pub struct CacheMetrics {
    /// Lookups that matched at least one block
    lookup_hits: AtomicU64,
    /// Lookups that matched nothing
    lookup_misses: AtomicU64,
    /// Successful block loads
    loads: AtomicU64,
    /// Successful block stores
    stores: AtomicU64,
    /// Blocks evicted by the worker
    evictions: AtomicU64,
    /// Total bytes served by loads
    bytes_loaded: AtomicU64,
    /// Total bytes written by stores
    bytes_stored: AtomicU64,
    /// Total bytes freed by eviction
    bytes_evicted: AtomicU64,
    /// Creation time for uptime calculation
    created_at: Instant,
}

impl CacheMetrics {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lookup_hits: AtomicU64::new(0),
            lookup_misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            bytes_loaded: AtomicU64::new(0),
            bytes_stored: AtomicU64::new(0),
            bytes_evicted: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Record a lookup; `hit` is whether any tokens matched.
    pub fn record_lookup(&self, hit: bool) {
        if hit {
            self.lookup_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.lookup_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a successful load of `bytes`.
    pub fn record_load(&self, bytes: u64) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.bytes_loaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a successful store of `bytes`.
    pub fn record_store(&self, bytes: u64) {
        self.stores.fetch_add(1, Ordering::Relaxed);
        self.bytes_stored.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an eviction freeing `bytes`.
    pub fn record_eviction(&self, bytes: u64) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.bytes_evicted.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Get the lookup hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.lookup_hits.load(Ordering::Relaxed);
        let misses = self.lookup_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Get the current snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            bytes_loaded: self.bytes_loaded.load(Ordering::Relaxed),
            bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
            bytes_evicted: self.bytes_evicted.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
            uptime_secs: self.created_at.elapsed().as_secs_f64(),
        }
    }

    /// Export metrics in Prometheus text format.
    #[must_use]
    pub fn export_prometheus(&self) -> String {
        let s = self.snapshot();

        format!(
            r#"# HELP warmstart_lookup_hits_total Lookups matching at least one block
# TYPE warmstart_lookup_hits_total counter
warmstart_lookup_hits_total {}

# HELP warmstart_lookup_misses_total Lookups matching nothing
# TYPE warmstart_lookup_misses_total counter
warmstart_lookup_misses_total {}

# HELP warmstart_loads_total Successful block loads
# TYPE warmstart_loads_total counter
warmstart_loads_total {}

# HELP warmstart_stores_total Successful block stores
# TYPE warmstart_stores_total counter
warmstart_stores_total {}

# HELP warmstart_evictions_total Blocks evicted
# TYPE warmstart_evictions_total counter
warmstart_evictions_total {}

# HELP warmstart_bytes_loaded_total Bytes served by loads
# TYPE warmstart_bytes_loaded_total counter
warmstart_bytes_loaded_total {}

# HELP warmstart_bytes_stored_total Bytes written by stores
# TYPE warmstart_bytes_stored_total counter
warmstart_bytes_stored_total {}

# HELP warmstart_bytes_evicted_total Bytes freed by eviction
# TYPE warmstart_bytes_evicted_total counter
warmstart_bytes_evicted_total {}
"#,
            s.lookup_hits,
            s.lookup_misses,
            s.loads,
            s.stores,
            s.evictions,
            s.bytes_loaded,
            s.bytes_stored,
            s.bytes_evicted,
        )
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of all counters.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub lookup_hits: u64,
    pub lookup_misses: u64,
    pub loads: u64,
    pub stores: u64,
    pub evictions: u64,
    pub bytes_loaded: u64,
    pub bytes_stored: u64,
    pub bytes_evicted: u64,
    /// Lookup hits over total lookups (0.0 to 1.0).
    pub hit_rate: f64,
    pub uptime_secs: f64,
}
