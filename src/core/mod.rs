//! # Core Module
//!
//! The pipeline engine.
//!
//! ## Modules
//! - `item` - The values flowing between stages
//! - `digest` - Digest strategies and the global limiter
//! - `stage` - SingleHash, MultiHash, Combine and custom stages
//! - `pipeline` - Queues, cancellation and the executor

pub mod digest;
pub mod item;
pub mod pipeline;
pub mod stage;

// Re-export commonly used types
pub use digest::{Digest, Digests, FnDigest};
pub use item::Item;
pub use pipeline::{CancellationToken, Pipeline, PipelineBuilder, PipelineResult};
pub use stage::{Combine, FanOutStage, FnStage, ItemWorker, MultiHash, SingleHash, Stage};
