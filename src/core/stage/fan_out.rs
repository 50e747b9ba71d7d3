//! Generic one-task-per-item stage.

use super::traits::{ItemWorker, Stage};
use crate::core::item::Item;
use crate::core::pipeline::{QueueReceiver, QueueSender, StageContext};
use crate::error::{panic_message, record_failure, DigestError, StageError};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, warn};

/// Runs an [`ItemWorker`] on a fresh task for every input item
///
/// Item-level fan-out is unbounded: the stage keeps reading its input while
/// earlier items are still being processed. Results are pushed as soon as
/// each item finishes, so output order follows completion order. The stage
/// returns only after every item task has finished.
pub struct FanOutStage<W> {
    worker: W,
}

impl<W: ItemWorker> FanOutStage<W> {
    pub fn new(worker: W) -> Self {
        Self { worker }
    }
}

impl<W: ItemWorker> Stage for FanOutStage<W> {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn run(
        &self,
        ctx: &StageContext,
        input: QueueReceiver,
        output: QueueSender,
    ) -> Result<usize, StageError> {
        let worker = &self.worker;
        let output = &output;

        thread::scope(|scope| {
            let input = input;
            let mut tasks = Vec::new();
            let mut failure = None;

            for (position, item) in input.iter().enumerate() {
                if ctx.is_cancelled() {
                    record_failure(&mut failure, StageError::Cancelled);
                    break;
                }
                // Converted here, once, before the item's task exists
                let text = match item.to_text() {
                    Ok(text) => text,
                    Err(source) => {
                        warn!(stage = worker.name(), position, error = %source, "malformed item");
                        ctx.cancel();
                        record_failure(&mut failure, StageError::Item { position, source });
                        break;
                    }
                };
                let task = scope.spawn(move || process_item(worker, ctx, output, position, text));
                tasks.push((position, task));
            }
            // Upstream may be blocked on a full queue; let it see the hang-up
            drop(input);

            let mut emitted = 0;
            for (position, task) in tasks {
                let outcome = task.join().unwrap_or_else(|payload| {
                    Err(StageError::TaskPanicked {
                        position,
                        message: panic_message(payload.as_ref()),
                    })
                });
                match outcome {
                    Ok(()) => emitted += 1,
                    Err(error) => record_failure(&mut failure, error),
                }
            }

            match failure {
                Some(error) => Err(error),
                None => {
                    debug!(stage = worker.name(), emitted, "all item tasks finished");
                    Ok(emitted)
                }
            }
        })
    }
}

fn process_item<W: ItemWorker>(
    worker: &W,
    ctx: &StageContext,
    output: &QueueSender,
    position: usize,
    text: String,
) -> Result<(), StageError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| worker.process(ctx, &text)));

    let outcome = match result {
        Ok(Ok(value)) => {
            ctx.emit_item(position, &value);
            output.push(Item::Text(value))
        }
        Ok(Err(DigestError::Cancelled)) => Err(StageError::Cancelled),
        Ok(Err(source)) => Err(StageError::Digest { position, source }),
        Err(payload) => Err(StageError::TaskPanicked {
            position,
            message: panic_message(payload.as_ref()),
        }),
    };

    if let Err(error) = &outcome {
        if !error.is_secondary() {
            warn!(stage = worker.name(), position, %error, "item failed, cancelling run");
            ctx.cancel();
        }
    }
    outcome
}
