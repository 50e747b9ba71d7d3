//! # Digest Module
//!
//! The digest primitives a pipeline run is built on, and the limiter that
//! guards the costly one.
//!
//! ## Roles
//! - **fast** (`F`) - cheap, may run with unlimited concurrency
//! - **limited** (`G`) - models a rate-limited shared backend; at most one
//!   call is in flight across a whole run
//!
//! ## Example
//! ```rust,ignore
//! use signer_pipeline::core::digest::{Digests, FnDigest};
//!
//! let digests = Digests::new(
//!     FnDigest::new("F", |s| format!("F({s})")),
//!     FnDigest::new("G", |s| format!("G({s})")),
//! );
//! ```

mod algorithms;
mod limiter;
mod traits;

pub use algorithms::{Delayed, Md5Digest, Xxh32Digest};
pub use limiter::{GlobalLimiter, LimiterPermit, LimiterStats, LIMITED_PERMITS};
pub use traits::{Digest, Digests, FnDigest};

impl Default for Digests {
    /// MD5 as the fast digest, xxh32 as the limited one
    fn default() -> Self {
        Digests::new(Md5Digest, Xxh32Digest::default())
    }
}
