//! # Stage Module
//!
//! The steps a pipeline is built from.
//!
//! ## Built-in Stages
//! - **SingleHash** - `G(s) ~ G(F(s))` per item
//! - **MultiHash** - `G(0s) .. G(5s)` concatenated in index order
//! - **Combine** - sorts every upstream value and joins them with `_`
//!
//! SingleHash and MultiHash are [`ItemWorker`]s run by a [`FanOutStage`],
//! which gives every item its own task. Combine and [`FnStage`] implement
//! [`Stage`] directly.

mod combine;
mod fan_out;
mod func;
mod multi_hash;
mod single_hash;
mod traits;

pub use combine::{combine_sorted, Combine, COMBINE_SEPARATOR};
pub use fan_out::FanOutStage;
pub use func::FnStage;
pub use multi_hash::{MultiHash, DEFAULT_MULTI_HASH_WIDTH};
pub use single_hash::{SingleHash, SINGLE_HASH_SEPARATOR};
pub use traits::{ItemWorker, Stage};

/// The classic signer chain: SingleHash, MultiHash, Combine
pub fn signer_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(FanOutStage::new(SingleHash::new())),
        Box::new(FanOutStage::new(MultiHash::new())),
        Box::new(Combine::new()),
    ]
}
