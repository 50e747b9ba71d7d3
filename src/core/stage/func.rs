//! Closure-backed stages with raw queue access.

use super::traits::Stage;
use crate::core::pipeline::{QueueReceiver, QueueSender, StageContext};
use crate::error::StageError;

type StageFn =
    dyn Fn(&StageContext, QueueReceiver, QueueSender) -> Result<usize, StageError> + Send + Sync;

/// A stage written as a plain function over its two queues
///
/// Useful for free-form jobs: a source that ignores its input, an observer
/// that passes items through, a filter. The closure owns the queue halves
/// and must return the number of items it emitted.
///
/// ```rust,ignore
/// let doubler = FnStage::new("double", |_ctx, input, output| {
///     let mut emitted = 0;
///     for item in input.iter() {
///         output.push(item.clone())?;
///         output.push(item)?;
///         emitted += 2;
///     }
///     Ok(emitted)
/// });
/// ```
pub struct FnStage {
    name: String,
    func: Box<StageFn>,
}

impl FnStage {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&StageContext, QueueReceiver, QueueSender) -> Result<usize, StageError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Stage for FnStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &self,
        ctx: &StageContext,
        input: QueueReceiver,
        output: QueueSender,
    ) -> Result<usize, StageError> {
        (self.func)(ctx, input, output)
    }
}

impl std::fmt::Debug for FnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}
