//! Cooperative cancellation shared by every task of a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable flag that aborts outstanding work when set
///
/// Tasks poll it before each digest call and limiter acquisition. A child
/// token also reports cancellation when any of its ancestors is cancelled,
/// but cancelling the child leaves them untouched; the executor uses a
/// fresh child per run so one failed run does not poison the next.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether this token or any ancestor was cancelled
    pub fn is_cancelled(&self) -> bool {
        let mut token = self;
        loop {
            if token.flag.load(Ordering::SeqCst) {
                return true;
            }
            match &token.parent {
                Some(parent) => token = parent.as_ref(),
                None => return false,
            }
        }
    }

    /// Create a token that follows this one but can be cancelled on its own
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }
}
