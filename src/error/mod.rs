//! # Error Module
//!
//! Error types for the signer pipeline.
//!
//! ## Design Principles
//! - **Never panic** on caller data - return errors instead
//! - **Include context** - which stage, which item, what went wrong
//! - **No silent partial results** - a failed item fails the run

use std::any::Any;
use thiserror::Error;

/// Top-level pipeline error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Expected a single text result, got {count} item(s)")]
    UnexpectedOutput { count: usize },

    #[error("Pipeline run was cancelled")]
    Cancelled,

    #[error("Failed to read input items: {0}")]
    Input(#[from] std::io::Error),
}

impl PipelineError {
    /// Name of the stage that failed, if the failure belongs to one
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Errors raised inside a single stage
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Item #{position} could not be converted: {source}")]
    Item {
        position: usize,
        #[source]
        source: ItemError,
    },

    #[error("Digest failed for item #{position}: {source}")]
    Digest {
        position: usize,
        #[source]
        source: DigestError,
    },

    #[error("Task for item #{position} panicked: {message}")]
    TaskPanicked { position: usize, message: String },

    #[error("Stage panicked: {message}")]
    StagePanicked { message: String },

    #[error("Downstream queue closed before all results were delivered")]
    Disconnected,

    #[error("Stage was cancelled")]
    Cancelled,

    #[error("{0}")]
    Custom(String),
}

impl StageError {
    /// Whether this error only echoes a failure that happened elsewhere.
    ///
    /// Used by the executor to report the root cause instead of the
    /// cascade of cancellations it triggers.
    pub fn is_secondary(&self) -> bool {
        matches!(self, StageError::Disconnected | StageError::Cancelled)
    }

    /// Position of the item this error belongs to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            StageError::Item { position, .. }
            | StageError::Digest { position, .. }
            | StageError::TaskPanicked { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Keep the most telling of several stage failures.
///
/// The first root cause wins; secondary errors only fill an empty slot.
pub(crate) fn record_failure(slot: &mut Option<StageError>, error: StageError) {
    let keep_current = slot
        .as_ref()
        .is_some_and(|current| !current.is_secondary() || error.is_secondary());
    if !keep_current {
        *slot = Some(error);
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Errors converting an item to its string form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("Malformed item: {reason}")]
    Malformed { reason: String },
}

/// Errors raised by digest primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    #[error("Digest '{digest}' failed on input '{input}': {reason}")]
    Failed {
        digest: String,
        input: String,
        reason: String,
    },

    #[error("Digest call aborted because the run was cancelled")]
    Cancelled,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;
