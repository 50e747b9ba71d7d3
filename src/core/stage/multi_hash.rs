//! MultiHash: `G(0s) G(1s) .. G(5s)` per item.

use super::traits::ItemWorker;
use crate::core::pipeline::StageContext;
use crate::error::{DigestError, PipelineError};
use rayon::prelude::*;

/// Number of indexed digests per item
pub const DEFAULT_MULTI_HASH_WIDTH: usize = 6;

/// Per item, computes `G(i + s)` for every index `i` in parallel and
/// concatenates the results in index order.
#[derive(Debug, Clone, Copy)]
pub struct MultiHash {
    width: usize,
}

impl MultiHash {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_MULTI_HASH_WIDTH,
        }
    }

    /// Use a different fan-out width
    pub fn with_width(width: usize) -> Result<Self, PipelineError> {
        if width == 0 {
            return Err(PipelineError::Config(
                "MultiHash width must be at least 1".to_string(),
            ));
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for MultiHash {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemWorker for MultiHash {
    fn name(&self) -> &str {
        "MultiHash"
    }

    fn process(&self, ctx: &StageContext, input: &str) -> Result<String, DigestError> {
        // Indexed collect keeps index order no matter which call finishes first
        let parts = (0..self.width)
            .into_par_iter()
            .map(|index| ctx.limited_digest(&format!("{index}{input}")))
            .collect::<Result<Vec<String>, DigestError>>()?;

        Ok(parts.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::test_support::stub_context;

    #[test]
    fn concatenates_in_index_order() {
        let ctx = stub_context("MultiHash");
        let result = MultiHash::new().process(&ctx, "x").unwrap();
        assert_eq!(result, "G(0x)G(1x)G(2x)G(3x)G(4x)G(5x)");
    }

    #[test]
    fn width_is_configurable() {
        let ctx = stub_context("MultiHash");
        let result = MultiHash::with_width(2).unwrap().process(&ctx, "ab").unwrap();
        assert_eq!(result, "G(0ab)G(1ab)");
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            MultiHash::with_width(0),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn default_width_is_six() {
        assert_eq!(MultiHash::default().width(), 6);
    }
}
