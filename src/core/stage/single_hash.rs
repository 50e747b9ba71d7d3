//! SingleHash: `G(s) ~ G(F(s))` per item.

use super::traits::ItemWorker;
use crate::core::pipeline::StageContext;
use crate::error::DigestError;

/// Joins the two halves of a SingleHash result
pub const SINGLE_HASH_SEPARATOR: &str = "~";

/// Per item, computes `F(s)`, then `G(s)` and `G(F(s))` concurrently.
///
/// Both limited calls queue on the run's global permit, so they never
/// actually overlap, but neither waits for the other to be scheduled.
/// The output is always `G(s) ~ G(F(s))`, whichever finishes first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleHash;

impl SingleHash {
    pub fn new() -> Self {
        Self
    }
}

impl ItemWorker for SingleHash {
    fn name(&self) -> &str {
        "SingleHash"
    }

    fn process(&self, ctx: &StageContext, input: &str) -> Result<String, DigestError> {
        let fast = ctx.fast_digest(input)?;

        let (plain, chained) = rayon::join(
            || ctx.limited_digest(input),
            || ctx.limited_digest(&fast),
        );

        Ok(format!("{}{}{}", plain?, SINGLE_HASH_SEPARATOR, chained?))
    }
}
