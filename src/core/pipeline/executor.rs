//! Pipeline execution implementation.

use super::queue::{bounded_queue, QueueReceiver, QueueSender};
use super::{CancellationToken, StageContext};
use crate::core::digest::{Digests, GlobalLimiter, LimiterStats};
use crate::core::item::Item;
use crate::core::stage::{signer_stages, FanOutStage, ItemWorker, Stage};
use crate::error::{panic_message, PipelineError, Result, StageError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelineSummary, StageEvent};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Identifier of the run
    pub run_id: Uuid,
    /// Everything the final stage emitted, in emission order
    pub outputs: Vec<Item>,
    /// Items fed into the first stage
    pub items_in: usize,
    /// Limited digest usage over the run
    pub limiter: LimiterStats,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    /// The run's single text result, as emitted by a Combine-style stage
    pub fn into_single_text(mut self) -> Result<String> {
        let count = self.outputs.len();
        match self.outputs.pop() {
            Some(item) if count == 1 => item
                .to_text()
                .map_err(|_| PipelineError::UnexpectedOutput { count }),
            _ => Err(PipelineError::UnexpectedOutput { count }),
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Capacity of every inter-stage queue; defaults to the dataset size
    pub queue_capacity: Option<usize>,
}

impl PipelineConfig {
    /// Queue capacity for a run over `items` inputs
    pub fn capacity_for(&self, items: usize) -> usize {
        self.queue_capacity.unwrap_or(items).max(1)
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
    digests: Option<Digests>,
    cancellation: Option<CancellationToken>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            stages: Vec::new(),
            digests: None,
            cancellation: None,
        }
    }

    /// Append a stage
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append a per-item worker, wrapped in a [`FanOutStage`]
    pub fn worker(self, worker: impl ItemWorker + 'static) -> Self {
        self.stage(FanOutStage::new(worker))
    }

    /// Append several stages
    pub fn stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Set the digest pair
    pub fn digests(mut self, digests: Digests) -> Self {
        self.digests = Some(digests);
        self
    }

    /// Override the inter-stage queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Let the caller abort runs from outside
    ///
    /// Once this token is cancelled, every current and later run of the
    /// pipeline fails with [`PipelineError::Cancelled`].
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            stages: self.stages,
            digests: self.digests.unwrap_or_default(),
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered chain of stages joined by bounded queues
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
    digests: Digests,
    cancellation: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// SingleHash, MultiHash, Combine over the given digests
    pub fn signer(digests: Digests) -> Pipeline {
        Pipeline::builder()
            .stages(signer_stages())
            .digests(digests)
            .build()
    }

    /// Stage names, in order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run the pipeline and return its single text result
    pub fn execute<I>(&self, items: I) -> Result<String>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.run(items)?.into_single_text()
    }

    /// Run the pipeline without events
    pub fn run<I>(&self, items: I) -> Result<PipelineResult>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        self.run_with_events(items, &null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events<I>(&self, items: I, events: &EventSender) -> Result<PipelineResult>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        // Rejected before the run exists, so observers never see it
        if self.stages.is_empty() {
            return Err(PipelineError::Config(
                "a pipeline needs at least one stage".to_string(),
            ));
        }

        let items: Vec<Item> = items.into_iter().map(Into::into).collect();
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);
        let _guard = span.enter();

        match self.run_stages(run_id, items, events) {
            Ok(result) => {
                info!(
                    items_in = result.items_in,
                    items_out = result.outputs.len(),
                    limited_calls = result.limiter.acquisitions,
                    duration_ms = result.duration_ms,
                    "pipeline completed"
                );
                events.send(Event::Pipeline(PipelineEvent::Completed {
                    summary: PipelineSummary {
                        run_id,
                        items_in: result.items_in,
                        items_out: result.outputs.len(),
                        limited_calls: result.limiter.acquisitions,
                        peak_limited_concurrency: result.limiter.peak_concurrency,
                        duration_ms: result.duration_ms,
                    },
                }));
                Ok(result)
            }
            Err(error) => {
                warn!(%error, "pipeline failed");
                events.send(Event::Pipeline(PipelineEvent::Failed {
                    run_id,
                    message: error.to_string(),
                }));
                Err(error)
            }
        }
    }

    fn run_stages(
        &self,
        run_id: Uuid,
        items: Vec<Item>,
        events: &EventSender,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let items_in = items.len();
        let capacity = self.config.capacity_for(items_in);
        let limiter = Arc::new(GlobalLimiter::new());
        let cancel = self.cancellation.child();

        events.send(Event::Pipeline(PipelineEvent::Started {
            run_id,
            total_items: items_in,
            stages: self.stage_names(),
        }));
        info!(items = items_in, stages = self.stages.len(), capacity, "pipeline started");

        // Every queue exists before any stage starts: queue k feeds stage k,
        // the last one is the result sink.
        let (mut senders, mut receivers): (VecDeque<QueueSender>, VecDeque<QueueReceiver>) =
            (0..=self.stages.len()).map(|_| bounded_queue(capacity)).unzip();
        let (Some(source), Some(sink)) = (senders.pop_front(), receivers.pop_back()) else {
            return Err(PipelineError::Config("queue wiring failed".to_string()));
        };

        let (outputs, outcomes) = thread::scope(|scope| {
            let stage_tasks: Vec<_> = self
                .stages
                .iter()
                .zip(receivers.into_iter().zip(senders))
                .enumerate()
                .map(|(index, (stage, (input, output)))| {
                    let ctx = StageContext::new(
                        stage.name(),
                        self.digests.clone(),
                        Arc::clone(&limiter),
                        cancel.clone(),
                        events.clone(),
                    );
                    scope.spawn(move || run_stage(index, &**stage, ctx, input, output))
                })
                .collect();

            let feeder_cancel = cancel.clone();
            scope.spawn(move || feed(source, items, &feeder_cancel));

            // Drained while the stages run, so the last stage never stalls
            let outputs: Vec<Item> = sink.iter().collect();

            let outcomes: Vec<std::result::Result<usize, StageError>> = stage_tasks
                .into_iter()
                .map(|task| {
                    task.join().unwrap_or_else(|payload| {
                        Err(StageError::StagePanicked {
                            message: panic_message(payload.as_ref()),
                        })
                    })
                })
                .collect();
            (outputs, outcomes)
        });

        match root_failure(outcomes) {
            Some((_, error)) if error.is_secondary() && cancel.is_cancelled() => {
                return Err(PipelineError::Cancelled);
            }
            Some((index, error)) => {
                return Err(PipelineError::Stage {
                    stage: self.stages[index].name().to_string(),
                    source: error,
                });
            }
            None if cancel.is_cancelled() => return Err(PipelineError::Cancelled),
            None => {}
        }

        Ok(PipelineResult {
            run_id,
            outputs,
            items_in,
            limiter: limiter.stats(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

/// Run one stage on its own task, trip the run's cancellation on failure
fn run_stage(
    index: usize,
    stage: &dyn Stage,
    ctx: StageContext,
    input: QueueReceiver,
    output: QueueSender,
) -> std::result::Result<usize, StageError> {
    let name = stage.name().to_string();
    debug!(stage = %name, index, capacity = output.capacity(), "stage started");
    ctx.events().send(Event::Stage(StageEvent::Started {
        stage: name.clone(),
        index,
    }));

    let result = panic::catch_unwind(AssertUnwindSafe(|| stage.run(&ctx, input, output)))
        .unwrap_or_else(|payload| {
            Err(StageError::StagePanicked {
                message: panic_message(payload.as_ref()),
            })
        });

    match &result {
        Ok(emitted) => {
            debug!(stage = %name, emitted, "stage completed");
            ctx.events().send(Event::Stage(StageEvent::Completed {
                stage: name,
                emitted: *emitted,
            }));
        }
        Err(error) => {
            if !error.is_secondary() {
                ctx.cancel();
            }
            warn!(stage = %name, %error, "stage failed");
            ctx.events().send(Event::Stage(StageEvent::Failed {
                stage: name,
                message: error.to_string(),
            }));
        }
    }
    result
}

/// Push the dataset into the first queue, then close it
fn feed(source: QueueSender, items: Vec<Item>, cancel: &CancellationToken) -> usize {
    let mut fed = 0;
    for item in items {
        if cancel.is_cancelled() || source.push(item).is_err() {
            break;
        }
        fed += 1;
    }
    debug!(fed, "source closed");
    fed
}

/// Pick the failure to report: the earliest stage with a root cause, else
/// the earliest stage that failed at all
fn root_failure(
    outcomes: Vec<std::result::Result<usize, StageError>>,
) -> Option<(usize, StageError)> {
    let mut failures: Vec<(usize, StageError)> = outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, outcome)| outcome.err().map(|error| (index, error)))
        .collect();

    let root = failures
        .iter()
        .position(|(_, error)| !error.is_secondary())
        .unwrap_or(0);
    if failures.is_empty() {
        None
    } else {
        Some(failures.swap_remove(root))
    }
}
