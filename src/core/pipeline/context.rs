//! Per-stage view of a pipeline run.

use super::CancellationToken;
use crate::core::digest::{Digests, GlobalLimiter};
use crate::error::DigestError;
use crate::events::{Event, EventSender, ItemOutput, StageEvent};
use std::sync::Arc;
use tracing::trace;

/// Everything a stage may touch besides its own queues
///
/// The limited digest is only reachable through [`limited_digest`], which
/// holds the run's single permit for exactly one call. Digests never see
/// the context, so they cannot re-acquire the permit.
///
/// [`limited_digest`]: StageContext::limited_digest
#[derive(Clone)]
pub struct StageContext {
    stage: String,
    digests: Digests,
    limiter: Arc<GlobalLimiter>,
    cancel: CancellationToken,
    events: EventSender,
}

impl StageContext {
    pub(crate) fn new(
        stage: impl Into<String>,
        digests: Digests,
        limiter: Arc<GlobalLimiter>,
        cancel: CancellationToken,
        events: EventSender,
    ) -> Self {
        Self {
            stage: stage.into(),
            digests,
            limiter,
            cancel,
            events,
        }
    }

    /// Name of the stage this context belongs to
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Call the fast digest
    pub fn fast_digest(&self, input: &str) -> Result<String, DigestError> {
        if self.cancel.is_cancelled() {
            return Err(DigestError::Cancelled);
        }
        self.digests.fast().digest(input)
    }

    /// Call the limited digest while holding the run-wide permit
    pub fn limited_digest(&self, input: &str) -> Result<String, DigestError> {
        let _permit = self.limiter.acquire(&self.cancel)?;
        trace!(stage = %self.stage, digest = self.digests.limited_name(), input, "limited digest");
        self.digests.limited().digest(input)
    }

    /// Whether the run is being aborted
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Abort every outstanding task of the run
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Publish an intermediate per-item result
    pub fn emit_item(&self, position: usize, output: &str) {
        self.events.send_with(|| {
            Event::Stage(StageEvent::ItemCompleted(ItemOutput {
                stage: self.stage.clone(),
                position,
                output: output.to_string(),
            }))
        });
    }

    pub(crate) fn events(&self) -> &EventSender {
        &self.events
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::digest::FnDigest;
    use crate::events::null_sender;

    /// A context over `F(s)`/`G(s)` wrapper stubs
    pub fn stub_context(stage: &str) -> StageContext {
        StageContext::new(
            stage,
            Digests::new(
                FnDigest::new("F", |s| format!("F({s})")),
                FnDigest::new("G", |s| format!("G({s})")),
            ),
            Arc::new(GlobalLimiter::new()),
            CancellationToken::new(),
            null_sender(),
        )
    }
}
