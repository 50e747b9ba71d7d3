//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted by the signer pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Pipeline-level events
    Pipeline(PipelineEvent),
    /// Per-stage events
    Stage(StageEvent),
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started {
        run_id: Uuid,
        total_items: usize,
        stages: Vec<String>,
    },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Failed { run_id: Uuid, message: String },
}

/// Events emitted by a single stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageEvent {
    /// Stage began consuming its input queue
    Started { stage: String, index: usize },
    /// One item made it through the stage
    ItemCompleted(ItemOutput),
    /// Stage drained its input and closed its output
    Completed { stage: String, emitted: usize },
    /// Stage stopped on an error
    Failed { stage: String, message: String },
}

/// An intermediate result produced by a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutput {
    /// Stage that produced the value
    pub stage: String,
    /// Position of the source item in the stage's input, in arrival order
    pub position: usize,
    /// The emitted value
    pub output: String,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Identifier shared by every event of the run
    pub run_id: Uuid,
    /// Items fed into the first stage
    pub items_in: usize,
    /// Items emitted by the final stage
    pub items_out: usize,
    /// Number of calls made to the limited digest
    pub limited_calls: usize,
    /// Highest number of limited calls observed in flight at once
    pub peak_limited_concurrency: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
