//! Handoff channel between the producer and consumer threads.
//!
//! An unbounded, closeable FIFO guarded by one mutex. Every operation takes
//! the lock, so pushes and pops are totally ordered by lock acquisition.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::types::SamplePair;

struct Inner<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// Thread-safe FIFO with blocking `take`, non-blocking `poll` and closure.
///
/// `close` lets a blocking consumer terminate on the channel itself: once
/// closed and empty, `take` returns `None` instead of waiting.
pub struct HandoffChannel<T = SamplePair> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> HandoffChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    // The queue holds plain values, so a panic while the lock was held
    // cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to the tail and wake one blocked taker. Never blocks on capacity.
    pub fn push(&self, item: T) {
        self.lock().queue.push_back(item);
        self.available.notify_one();
    }

    /// Remove the head, waiting while the channel is empty and open.
    ///
    /// Returns `None` only when the channel is closed and drained.
    pub fn take(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.queue.pop_front() {
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the head if there is one, without waiting.
    pub fn poll(&self) -> Option<T> {
        self.lock().queue.pop_front()
    }

    /// Point-in-time snapshot; may be stale as soon as it returns.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Point-in-time snapshot; may be stale as soon as it returns.
    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Mark the channel closed and wake every blocked taker.
    ///
    /// Items already queued are still delivered.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> Default for HandoffChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_preserved_with_poll() {
        let channel = HandoffChannel::new();
        let input: Vec<SamplePair> = (0..=255u8).map(|i| SamplePair::new(i, 255 - i)).collect();
        for pair in &input {
            channel.push(*pair);
        }
        assert_eq!(channel.len(), input.len());

        let output: Vec<SamplePair> = std::iter::from_fn(|| channel.poll()).collect();
        assert_eq!(output, input);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_fifo_preserved_with_take() {
        let channel = HandoffChannel::new();
        for i in 0..100u32 {
            channel.push(i);
        }
        let output: Vec<u32> = (0..100).map(|_| channel.take().unwrap()).collect();
        assert_eq!(output, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_poll_on_empty_returns_none() {
        let channel: HandoffChannel<u8> = HandoffChannel::new();
        assert!(channel.poll().is_none());
        assert!(channel.is_empty());
        assert_eq!(channel.len(), 0);
    }

    #[test]
    fn test_take_blocks_until_push() {
        let channel = Arc::new(HandoffChannel::new());
        let taker = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.take())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!taker.is_finished(), "take must wait for an element");
        channel.push(SamplePair::new(9, 8));
        assert_eq!(taker.join().unwrap(), Some(SamplePair::new(9, 8)));
    }

    #[test]
    fn test_close_wakes_blocked_taker() {
        let channel: Arc<HandoffChannel<u8>> = Arc::new(HandoffChannel::new());
        let taker = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.take())
        };
        thread::sleep(Duration::from_millis(20));
        channel.close();
        assert_eq!(taker.join().unwrap(), None);
        assert!(channel.is_closed());
    }

    #[test]
    fn test_closed_channel_still_delivers_queued_items() {
        let channel = HandoffChannel::new();
        channel.push(1u8);
        channel.push(2u8);
        channel.close();
        assert_eq!(channel.take(), Some(1));
        assert_eq!(channel.poll(), Some(2));
        assert_eq!(channel.take(), None);
    }

    #[test]
    fn test_concurrent_producer_consumer_order() {
        let channel = Arc::new(HandoffChannel::new());
        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    channel.push(i);
                }
                channel.close();
            })
        };
        let received: Vec<u32> = std::iter::from_fn(|| channel.take()).collect();
        producer.join().unwrap();
        assert_eq!(received, (0..10_000).collect::<Vec<_>>());
    }
}
