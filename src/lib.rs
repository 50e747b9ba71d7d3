//! # Signer Pipeline
//!
//! A concurrent multi-stage hashing pipeline with deterministic output.
//!
//! ## Core Guarantees
//! - **Pipelined** - every stage runs alongside its neighbours, joined by
//!   bounded queues that apply backpressure and never drop items
//! - **Deterministic** - per-item sub-results are joined by role or index,
//!   and the final Combine sorts, so scheduling never changes the output
//! - **Rate-limited** - at most one call to the limited digest is in
//!   flight across a whole run
//! - **No silent failures** - a failed or panicking item fails the run and
//!   names the stage and item
//!
//! ## Architecture
//! - `core` - Items, digests, stages and the executor
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//!
//! ## Example
//! ```rust,ignore
//! use signer_pipeline::core::{Digests, FnDigest, Pipeline};
//!
//! let pipeline = Pipeline::signer(Digests::new(
//!     FnDigest::new("F", |s| format!("F({s})")),
//!     FnDigest::new("G", |s| format!("G({s})")),
//! ));
//! let combined = pipeline.execute(vec![1, 2, 3])?;
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{PipelineError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
