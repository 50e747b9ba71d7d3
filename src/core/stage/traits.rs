//! Trait definitions for pipeline stages.

use crate::core::pipeline::{QueueReceiver, QueueSender, StageContext};
use crate::error::{DigestError, StageError};

/// One step of a pipeline
///
/// A stage runs as a single long-lived task. It owns both queue halves:
/// returning from [`run`](Stage::run) drops `output`, which closes the
/// queue for the next stage, so a stage must not return before everything
/// it spawned has finished emitting.
pub trait Stage: Send + Sync {
    /// Name used in events, logs and errors
    fn name(&self) -> &str;

    /// Consume `input` until it closes, pushing results to `output`.
    ///
    /// Returns the number of items emitted.
    fn run(
        &self,
        ctx: &StageContext,
        input: QueueReceiver,
        output: QueueSender,
    ) -> Result<usize, StageError>;
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(
        &self,
        ctx: &StageContext,
        input: QueueReceiver,
        output: QueueSender,
    ) -> Result<usize, StageError> {
        (**self).run(ctx, input, output)
    }
}

/// Per-item work for a [`FanOutStage`](super::FanOutStage)
///
/// Called once per input item, on its own task, with the item's string
/// form. Produces exactly one output.
pub trait ItemWorker: Send + Sync {
    /// Name used in events, logs and errors
    fn name(&self) -> &str;

    /// Transform one item
    fn process(&self, ctx: &StageContext, input: &str) -> Result<String, DigestError>;
}
