//! # warmstart-core
//!
//! Core infrastructure for the warmstart prefix cache.
//!
//! Provides shared abstractions for:
//! - Object storage backends (S3, local filesystem, in-memory)
//! - Hashing (xxhash)
//! - The common error type

pub mod error;
pub mod hashing;
pub mod storage;

pub use error::{Result, WarmstartError};
pub use hashing::{HashFunction, XxHash3};
#[cfg(feature = "s3")]
pub use storage::S3Storage;
pub use storage::{LocalStorage, MemoryStorage, ObjectStore};
