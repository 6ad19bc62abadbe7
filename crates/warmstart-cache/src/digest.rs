//! Content digest of token prefixes.
//!
//! Two workers that tokenize the same prompt against the same model must
//! derive the same object keys, so the digest is a pure function of
//! `(model id, block size, tokens)` with no per-instance salting. The
//! canonical encoding is hashed with XXH3-128.

use thiserror::Error;
use warmstart_core::hashing::{HashFunction, XxHash3};

/// Version byte of the canonical encoding. Bump on any layout change so
/// old and new digests can never collide.
pub const ENCODING_VERSION: u8 = 1;

/// Errors that can occur while computing a prefix digest.
#[derive(Error, Debug)]
pub enum DigestError {
    /// Model identifier longer than the encoding's u16 length field allows.
    #[error("Model id is {0} bytes, maximum is 65535")]
    ModelIdTooLong(usize),
}

/// 128-bit content digest of a token prefix.
///
/// Canonical encoding (all integers little-endian):
///
/// ```text
/// [u8  version = 1]
/// [u32 block_size_tokens]
/// [u16 model_id_byte_length]
/// [bytes model_id]
/// [u32 token]*
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrefixDigest([u8; 16]);

impl PrefixDigest {
    /// Compute the digest of `tokens` under `(model_id, block_size)`.
    pub fn compute(
        model_id: &str,
        block_size: u32,
        tokens: &[u32],
    ) -> Result<Self, DigestError> {
        if model_id.len() > u16::MAX as usize {
            return Err(DigestError::ModelIdTooLong(model_id.len()));
        }

        let mut buf =
            Vec::with_capacity(1 + 4 + 2 + model_id.len() + tokens.len() * 4);
        buf.push(ENCODING_VERSION);
        buf.extend_from_slice(&block_size.to_le_bytes());
        buf.extend_from_slice(&(model_id.len() as u16).to_le_bytes());
        buf.extend_from_slice(model_id.as_bytes());
        for &token in tokens {
            buf.extend_from_slice(&token.to_le_bytes());
        }

        let hash = XxHash3::new().hash(&buf);
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&hash);
        Ok(Self(digest))
    }

    /// Lowercase hex rendering, as used in object keys.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}
