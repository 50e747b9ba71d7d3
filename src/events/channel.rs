//! Event channel between a pipeline run and its observers.
//!
//! A run publishes into an [`EventSender`]; the observer reads the
//! [`EventReceiver`] on its own thread. Runs nobody watches get a
//! detached sender that builds no events at all.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{Event, ItemOutput, StageEvent};

/// Publishing half, cloned into every stage of a run
///
/// Sending never blocks a stage: the channel is unbounded and a dropped
/// receiver just means nobody is listening any more.
#[derive(Clone)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Publish an event
    pub fn send(&self, event: Event) {
        if let Some(inner) = &self.inner {
            let _ = inner.send(event);
        }
    }

    /// Publish an event built on demand
    ///
    /// `make` only runs when the sender is attached to a receiver, so the
    /// per-item diagnostic events of an unobserved run cost nothing.
    pub fn send_with(&self, make: impl FnOnce() -> Event) {
        if let Some(inner) = &self.inner {
            let _ = inner.send(make());
        }
    }

    /// Whether events from this sender can reach anyone
    pub fn is_observed(&self) -> bool {
        self.inner.is_some()
    }
}

/// Observing half
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Every event, ending once all senders are gone
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Only the intermediate per-item results, in publication order
    pub fn item_outputs(&self) -> impl Iterator<Item = ItemOutput> + '_ {
        self.inner.iter().filter_map(|event| match event {
            Event::Stage(StageEvent::ItemCompleted(item)) => Some(item),
            _ => None,
        })
    }
}

/// Opens sender/receiver pairs for observed runs
pub struct EventChannel;

impl EventChannel {
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender {
                inner: Some(sender),
            },
            EventReceiver { inner: receiver },
        )
    }
}

/// A detached sender for runs nobody observes
pub fn null_sender() -> EventSender {
    EventSender { inner: None }
}
