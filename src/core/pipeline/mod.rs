//! # Pipeline Module
//!
//! Wires stages together and runs them.
//!
//! ## How a Run Works
//! 1. **Wire** - one bounded queue per stage boundary, all created up front
//! 2. **Start** - every stage gets its own long-lived task
//! 3. **Feed** - the dataset is pushed into the first queue, which is then closed
//! 4. **Drain** - each stage closes its output once its input is exhausted;
//!    the executor collects what the final stage emits
//!
//! ## Concurrency
//! Stages overlap in time: stage k+1 consumes while stage k still produces.
//! A single [`GlobalLimiter`](crate::core::digest::GlobalLimiter) per run
//! caps calls to the limited digest. Any failure cancels the run's token so
//! outstanding item tasks stop early, and the root cause is reported.

mod cancel;
mod context;
mod executor;
mod queue;

pub use cancel::CancellationToken;
pub use context::StageContext;
pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
pub use queue::{bounded_queue, QueueReceiver, QueueSender};

#[cfg(test)]
pub(crate) use context::test_support;
