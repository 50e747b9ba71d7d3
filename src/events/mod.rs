//! # Events Module
//!
//! Event-driven progress reporting for pipeline runs.
//!
//! ## Design
//! The pipeline emits events through channels, so any observer (CLI,
//! GUI, test) can subscribe. Every intermediate per-item result of every
//! stage is published as [`StageEvent::ItemCompleted`], which makes the
//! receiver a lazy diagnostic stream of the run.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for item in receiver.item_outputs() {
//!         println!("{} #{} -> {}", item.stage, item.position, item.output);
//!     }
//! });
//!
//! pipeline.run_with_events(items, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
