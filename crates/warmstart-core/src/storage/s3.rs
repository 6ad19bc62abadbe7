//! S3-compatible storage backend.
//!
//! Works with AWS S3, MinIO, and other S3-compatible services. Built on
//! `rust-s3` in sync mode so every call blocks the caller, matching the
//! [`ObjectStore`] contract.
//!
//! # Example
//!
//! ```rust,no_run
//! use warmstart_core::storage::S3Storage;
//!
//! # fn example() -> warmstart_core::Result<()> {
//! // Connect to MinIO (local testing), path-style addressing
//! let storage = S3Storage::new(
//!     "kv-cache",
//!     "us-east-1",
//!     Some("http://127.0.0.1:9000"),
//!     Some(("minioadmin", "minioadmin")),
//!     true,
//! )?;
//! # Ok(())
//! # }
//! ```

use super::ObjectStore;
use crate::error::{Result, WarmstartError};
use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};

/// S3-compatible storage backend.
pub struct S3Storage {
    bucket: Box<Bucket>,
}

impl S3Storage {
    /// Create a new S3 storage backend.
    ///
    /// # Arguments
    /// * `bucket_name` - Name of the S3 bucket
    /// * `region` - AWS region (e.g., "us-east-1")
    /// * `endpoint` - Optional custom endpoint URL (for MinIO, LocalStack, etc.)
    /// * `credentials` - Optional (access key id, secret access key); falls
    ///   back to the standard AWS environment variables when `None`
    /// * `path_style` - Use path-style addressing instead of virtual-hosted
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        credentials: Option<(&str, &str)>,
        path_style: bool,
    ) -> Result<Self> {
        let region = if let Some(endpoint) = endpoint {
            Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            }
        } else {
            region
                .parse()
                .map_err(|e| WarmstartError::Config(format!("Invalid region: {}", e)))?
        };

        let credentials = match credentials {
            Some((access_key, secret_key)) => {
                Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            }
            None => Credentials::from_env(),
        }
        .map_err(|e| WarmstartError::Config(format!("Failed to load credentials: {}", e)))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| WarmstartError::Config(format!("Failed to create bucket: {}", e)))?;

        let bucket = if path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self { bucket })
    }

    fn is_not_found(err_str: &str) -> bool {
        err_str.contains("404") || err_str.contains("NoSuchKey")
    }
}

impl ObjectStore for S3Storage {
    fn get(&self, key: &str) -> Result<Bytes> {
        let response = self.bucket.get_object(key).map_err(|e| {
            if Self::is_not_found(&e.to_string()) {
                WarmstartError::NotFound(key.to_string())
            } else {
                WarmstartError::Storage(format!("S3 get failed: {}", e))
            }
        })?;

        match response.status_code() {
            200 => Ok(Bytes::from(response.to_vec())),
            404 => Err(WarmstartError::NotFound(key.to_string())),
            code => Err(WarmstartError::Storage(format!(
                "S3 get failed with status {}",
                code
            ))),
        }
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.bucket
            .put_object(key, &data)
            .map_err(|e| WarmstartError::Storage(format!("S3 put failed: {}", e)))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.bucket.delete_object(key) {
            Ok(_) => Ok(()),
            // Deleting an absent key is a success.
            Err(e) if Self::is_not_found(&e.to_string()) => Ok(()),
            Err(e) => Err(WarmstartError::Storage(format!("S3 delete failed: {}", e))),
        }
    }
}
