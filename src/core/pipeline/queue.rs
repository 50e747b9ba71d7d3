//! Bounded hand-off queues between stages, built on crossbeam-channel.
//!
//! A queue has exactly one logical producer. It is closed when every
//! [`QueueSender`] clone is dropped; consumers then drain whatever is
//! buffered and see the end of the stream. Nothing is ever dropped: a full
//! queue blocks the producer instead.

use crate::core::item::Item;
use crate::error::StageError;
use crossbeam_channel::{bounded, Receiver, Sender};

/// Create a queue holding at most `capacity` items (at least one)
pub fn bounded_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (sender, receiver) = bounded(capacity.max(1));
    (QueueSender { inner: sender }, QueueReceiver { inner: receiver })
}

/// Producer half of a stage queue
#[derive(Debug, Clone)]
pub struct QueueSender {
    inner: Sender<Item>,
}

impl QueueSender {
    /// Push an item, blocking while the queue is full
    ///
    /// Fails with [`StageError::Disconnected`] once the consumer is gone.
    pub fn push(&self, item: Item) -> Result<(), StageError> {
        self.inner.send(item).map_err(|_| StageError::Disconnected)
    }

    /// Maximum number of buffered items
    pub fn capacity(&self) -> usize {
        self.inner.capacity().unwrap_or(usize::MAX)
    }

    /// Signal that this producer is done
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer half of a stage queue
#[derive(Debug)]
pub struct QueueReceiver {
    inner: Receiver<Item>,
}

impl QueueReceiver {
    /// Block for the next item; `None` once the queue is closed and drained
    pub fn pop(&self) -> Option<Item> {
        self.inner.recv().ok()
    }

    /// Iterate until the queue is closed and drained
    pub fn iter(&self) -> impl Iterator<Item = Item> + '_ {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn items_arrive_in_push_order() {
        let (sender, receiver) = bounded_queue(4);
        sender.push(Item::from(1)).unwrap();
        sender.push(Item::from(2)).unwrap();
        sender.close();

        let items: Vec<Item> = receiver.iter().collect();
        assert_eq!(items, vec![Item::from(1), Item::from(2)]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (sender, _receiver) = bounded_queue(0);
        assert_eq!(sender.capacity(), 1);
    }

    #[test]
    fn full_queue_blocks_until_consumed() {
        let (sender, receiver) = bounded_queue(1);
        sender.push(Item::from("first")).unwrap();

        thread::scope(|scope| {
            let producer = scope.spawn(|| sender.push(Item::from("second")));
            thread::sleep(Duration::from_millis(20));
            assert!(!producer.is_finished());

            assert_eq!(receiver.pop(), Some(Item::from("first")));
            producer.join().unwrap().unwrap();
        });

        assert_eq!(receiver.pop(), Some(Item::from("second")));
    }

    #[test]
    fn push_fails_after_consumer_drops() {
        let (sender, receiver) = bounded_queue(1);
        drop(receiver);

        let result = sender.push(Item::from(1));
        assert!(matches!(result, Err(StageError::Disconnected)));
    }
}
