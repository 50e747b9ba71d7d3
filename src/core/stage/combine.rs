//! Combine: the order-independent fan-in at the end of a pipeline.

use super::traits::Stage;
use crate::core::item::Item;
use crate::core::pipeline::{QueueReceiver, QueueSender, StageContext};
use crate::error::StageError;
use tracing::debug;

/// Joins the sorted Combine inputs
pub const COMBINE_SEPARATOR: &str = "_";

/// Sort `values` lexicographically and join them with `separator`
pub fn combine_sorted<I>(values: I, separator: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut values: Vec<String> = values.into_iter().collect();
    values.sort_unstable();
    values.join(separator)
}

/// Collects every upstream item and emits one sorted, joined value
///
/// Nothing is emitted until the input queue closes. With no input the
/// single emitted value is the empty string.
#[derive(Debug, Clone)]
pub struct Combine {
    separator: String,
}

impl Combine {
    pub fn new() -> Self {
        Self {
            separator: COMBINE_SEPARATOR.to_string(),
        }
    }

    /// Use a different separator
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for Combine {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Combine {
    fn name(&self) -> &str {
        "Combine"
    }

    fn run(
        &self,
        ctx: &StageContext,
        input: QueueReceiver,
        output: QueueSender,
    ) -> Result<usize, StageError> {
        let mut collected = Vec::new();
        for (position, item) in input.iter().enumerate() {
            let text = item
                .to_text()
                .map_err(|source| StageError::Item { position, source })?;
            collected.push(text);
        }
        // An aborted upstream may have closed early; never publish a partial result
        if ctx.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        debug!(items = collected.len(), "combining");
        let combined = combine_sorted(collected, &self.separator);
        ctx.emit_item(0, &combined);
        output.push(Item::Text(combined))?;
        Ok(1)
    }
}
