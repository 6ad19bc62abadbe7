//! Object storage abstraction.
//!
//! Provides a unified blocking interface for storing and retrieving opaque
//! byte payloads under flat string keys:
//! - S3-compatible storage (with `s3` feature)
//! - Local filesystem (always available)
//! - In-memory (tests and benchmarks)

mod local;
mod memory;

#[cfg(feature = "s3")]
mod s3;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

#[cfg(feature = "s3")]
pub use s3::S3Storage;

use crate::error::Result;
use bytes::Bytes;

/// Trait for object storage backends.
///
/// All methods block the calling thread; callers that need the index to
/// stay responsive must not hold locks across these calls.
pub trait ObjectStore: Send + Sync {
    /// Get the payload stored at `key`.
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Create or overwrite the payload at `key`.
    fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Delete the payload at `key`. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<()>;
}
