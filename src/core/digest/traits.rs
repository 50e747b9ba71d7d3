//! Trait definitions for digest primitives.

use crate::error::DigestError;
use std::fmt;
use std::sync::Arc;

/// A deterministic string-to-string digest
///
/// Implementations must be pure: the same input always yields the same
/// output, and calls from many threads at once are allowed.
pub trait Digest: Send + Sync {
    /// Compute the digest of `input`
    fn digest(&self, input: &str) -> Result<String, DigestError>;

    /// Short name used in logs and error messages
    fn name(&self) -> &str;
}

type DigestFn = dyn Fn(&str) -> Result<String, DigestError> + Send + Sync;

/// Adapts a closure into a [`Digest`]
///
/// Handy for stubs in tests:
/// ```rust,ignore
/// let fast = FnDigest::new("F", |s| format!("F({s})"));
/// ```
pub struct FnDigest {
    name: String,
    func: Box<DigestFn>,
}

impl FnDigest {
    /// Wrap an infallible closure
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |input: &str| Ok(func(input))),
        }
    }

    /// Wrap a closure that may fail
    pub fn fallible<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<String, DigestError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Digest for FnDigest {
    fn digest(&self, input: &str) -> Result<String, DigestError> {
        (self.func)(input)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FnDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDigest").field("name", &self.name).finish()
    }
}

/// The pair of digests a pipeline run is built on
///
/// `fast` may be called freely. `limited` models a costly shared backend
/// and is only reachable through the run's global limiter, see
/// [`StageContext::limited_digest`](crate::core::pipeline::StageContext::limited_digest).
#[derive(Clone)]
pub struct Digests {
    fast: Arc<dyn Digest>,
    limited: Arc<dyn Digest>,
}

impl Digests {
    /// Create a digest pair from a fast and a limited digest
    pub fn new(fast: impl Digest + 'static, limited: impl Digest + 'static) -> Self {
        Self {
            fast: Arc::new(fast),
            limited: Arc::new(limited),
        }
    }

    /// The fast, unlimited digest
    pub fn fast(&self) -> &dyn Digest {
        self.fast.as_ref()
    }

    pub(crate) fn limited(&self) -> &dyn Digest {
        self.limited.as_ref()
    }

    /// Name of the limited digest
    pub fn limited_name(&self) -> &str {
        self.limited.name()
    }
}

impl fmt::Debug for Digests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Digests")
            .field("fast", &self.fast.name())
            .field("limited", &self.limited.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_digest_applies_closure() {
        let digest = FnDigest::new("G", |s| format!("G({s})"));
        assert_eq!(digest.digest("x").unwrap(), "G(x)");
        assert_eq!(digest.name(), "G");
    }

    #[test]
    fn fallible_digest_reports_failure() {
        let digest = FnDigest::fallible("broken", |s| {
            Err(DigestError::Failed {
                digest: "broken".to_string(),
                input: s.to_string(),
                reason: "offline".to_string(),
            })
        });
        assert!(digest.digest("x").is_err());
    }

    #[test]
    fn digests_expose_names() {
        let digests = Digests::new(
            FnDigest::new("F", |s| s.to_string()),
            FnDigest::new("G", |s| s.to_string()),
        );
        assert_eq!(digests.fast().name(), "F");
        assert_eq!(digests.limited_name(), "G");
        assert!(format!("{:?}", digests).contains("\"G\""));
    }
}
