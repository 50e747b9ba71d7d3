//! The run-wide limiter guarding the costly digest.

use crate::core::pipeline::CancellationToken;
use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Number of limited digest calls allowed in flight at once
pub const LIMITED_PERMITS: usize = 1;

/// How often a waiting task re-checks cancellation
const CANCEL_POLL: Duration = Duration::from_millis(5);

/// Usage counters collected over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterStats {
    /// Permits handed out so far
    pub acquisitions: usize,
    /// Highest number of permits held at the same time
    pub peak_concurrency: usize,
}

#[derive(Debug, Default)]
struct LimiterState {
    in_use: usize,
    stats: LimiterStats,
}

/// A counting permit shared by every task of one pipeline run
///
/// Created once per run and handed to each stage through its context, so
/// the cap holds across items and stages, not per stage.
#[derive(Debug)]
pub struct GlobalLimiter {
    permits: usize,
    state: Mutex<LimiterState>,
    released: Condvar,
}

impl GlobalLimiter {
    /// Create a limiter with [`LIMITED_PERMITS`] permits
    pub fn new() -> Self {
        Self {
            permits: LIMITED_PERMITS,
            state: Mutex::new(LimiterState::default()),
            released: Condvar::new(),
        }
    }

    /// Block until a permit is free or the run is cancelled
    pub fn acquire(&self, cancel: &CancellationToken) -> Result<LimiterPermit<'_>, DigestError> {
        let mut state = self.lock();
        while state.in_use >= self.permits {
            if cancel.is_cancelled() {
                return Err(DigestError::Cancelled);
            }
            state = self
                .released
                .wait_timeout(state, CANCEL_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        if cancel.is_cancelled() {
            return Err(DigestError::Cancelled);
        }

        state.in_use += 1;
        state.stats.acquisitions += 1;
        state.stats.peak_concurrency = state.stats.peak_concurrency.max(state.in_use);
        Ok(LimiterPermit { limiter: self })
    }

    /// Counters collected so far
    pub fn stats(&self) -> LimiterStats {
        self.lock().stats
    }

    // The state is plain counters that are never left half-updated, so a
    // poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        let mut state = self.lock();
        state.in_use = state.in_use.saturating_sub(1);
        drop(state);
        self.released.notify_one();
    }
}

impl Default for GlobalLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// A held permit; released on drop, including during unwinding
#[must_use = "the permit is released as soon as it is dropped"]
#[derive(Debug)]
pub struct LimiterPermit<'a> {
    limiter: &'a GlobalLimiter,
}

impl Drop for LimiterPermit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
