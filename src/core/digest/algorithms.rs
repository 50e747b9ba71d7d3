//! Ready-made digest strategies.
//!
//! These wrap existing hashing crates; the pipeline itself treats them as
//! opaque [`Digest`]s like any caller-supplied one.

use super::traits::Digest;
use crate::error::DigestError;
use std::thread;
use std::time::Duration;
use xxhash_rust::xxh32::xxh32;

/// MD5, rendered as lowercase hex
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digest;

impl Digest for Md5Digest {
    fn digest(&self, input: &str) -> Result<String, DigestError> {
        Ok(format!("{:x}", md5::compute(input.as_bytes())))
    }

    fn name(&self) -> &str {
        "md5"
    }
}

/// 32-bit xxHash, rendered in decimal
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh32Digest {
    seed: u32,
}

impl Xxh32Digest {
    /// Create a digest with a custom seed
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl Digest for Xxh32Digest {
    fn digest(&self, input: &str) -> Result<String, DigestError> {
        Ok(xxh32(input.as_bytes(), self.seed).to_string())
    }

    fn name(&self) -> &str {
        "xxh32"
    }
}

/// Adds a fixed latency to every call of the wrapped digest
///
/// Models a slow remote backend, which is what the global limiter exists
/// to protect.
#[derive(Debug, Clone)]
pub struct Delayed<D> {
    inner: D,
    latency: Duration,
}

impl<D: Digest> Delayed<D> {
    pub fn new(inner: D, latency: Duration) -> Self {
        Self { inner, latency }
    }
}

impl<D: Digest> Digest for Delayed<D> {
    fn digest(&self, input: &str) -> Result<String, DigestError> {
        thread::sleep(self.latency);
        self.inner.digest(input)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
