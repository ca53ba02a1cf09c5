//! Single-producer, multi-consumer broadcast ring.
//!
//! Every consumer observes every published value, in publish order, at its
//! own pace. Consumers never coordinate with each other or with the producer:
//! a consumer that falls a full lap behind sees [`Poll::Overrun`] instead of
//! corrupted data, and sizing the ring so that this does not happen in steady
//! state is the caller's job.
//!
//! ```
//! use seqring::{spmc, Config};
//!
//! let (mut producer, mut first) = spmc::channel(Config::new(8)?);
//! let mut second = producer.subscribe();
//!
//! producer.publish(1);
//! producer.publish(2);
//!
//! assert_eq!(first.try_pop(), Some(1));
//! assert_eq!(first.try_pop(), Some(2));
//! assert_eq!(second.try_pop(), Some(1));
//! # Ok::<(), seqring::ConfigError>(())
//! ```

use crate::diagnostics::{ConsumerId, Diagnostics};
use crate::ring::{Poll, RingCore};
use crate::sync::Arc;
use crate::{Config, Cursor};
use crossbeam_utils::Backoff;

/// Creates a broadcast ring and its first consumer.
pub fn channel(config: Config) -> (Producer, Consumer) {
    build(RingCore::new(config, None))
}

/// Creates a broadcast ring that reports every event to `diagnostics`.
pub fn channel_with_diagnostics(
    config: Config,
    diagnostics: std::sync::Arc<dyn Diagnostics>,
) -> (Producer, Consumer) {
    build(RingCore::new(config, Some(diagnostics)))
}

fn build(core: RingCore) -> (Producer, Consumer) {
    let ring = Arc::new(core);
    let consumer = Consumer::at(Arc::clone(&ring), Cursor::new());
    (Producer { ring }, consumer)
}

/// The single writer of a broadcast ring.
///
/// Not `Clone`; `publish` takes `&mut self`, so only one thread can ever write.
pub struct Producer {
    ring: Arc<RingCore>,
}

impl Producer {
    /// Publishes `value` into the next slot.
    ///
    /// Never blocks and never fails. It also never checks for unread slots:
    /// publishing more than `capacity` values ahead of the slowest consumer
    /// overwrites them.
    #[inline]
    pub fn publish(&mut self, value: u64) {
        self.ring.publish(value);
    }

    /// Number of values published so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.ring.write_position()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.config().capacity()
    }

    #[inline]
    pub fn config(&self) -> Config {
        *self.ring.config()
    }

    /// Creates a consumer starting at the beginning of the ring.
    ///
    /// If the producer has already published more than `capacity` values the
    /// new consumer starts out lapped; use [`subscribe_latest`] to join at the
    /// current position instead.
    ///
    /// [`subscribe_latest`]: Producer::subscribe_latest
    pub fn subscribe(&self) -> Consumer {
        Consumer::at(Arc::clone(&self.ring), Cursor::new())
    }

    /// Creates a consumer that only sees values published from now on.
    pub fn subscribe_latest(&self) -> Consumer {
        let cursor = Cursor::at_position(self.ring.write_position(), self.ring.config());
        Consumer::at(Arc::clone(&self.ring), cursor)
    }
}

/// One independent reader of a broadcast ring.
///
/// Cloning a consumer forks it: the clone gets a new id and continues from the
/// same position, after which the two progress independently.
pub struct Consumer {
    ring: Arc<RingCore>,
    cursor: Cursor,
    id: ConsumerId,
}

impl Consumer {
    fn at(ring: Arc<RingCore>, cursor: Cursor) -> Self {
        let id = ring.register_consumer();
        Self { ring, cursor, id }
    }

    /// Returns the next value if it has been fully published.
    ///
    /// `None` is the normal result when the producer has not caught up, when
    /// a write is in flight, or when this consumer has been lapped. Use
    /// [`poll`](Consumer::poll) to tell those apart.
    #[inline]
    pub fn try_pop(&mut self) -> Option<u64> {
        self.poll().ready()
    }

    /// Polls the next slot once, advancing only on [`Poll::Ready`].
    #[inline]
    pub fn poll(&mut self) -> Poll {
        self.ring.poll(&mut self.cursor, self.id)
    }

    /// Polls with adaptive backoff (spin, then yield) until a value arrives
    /// or the backoff is exhausted.
    ///
    /// Returns `None` immediately on overrun, since waiting cannot fix it.
    pub fn poll_with_backoff(&mut self) -> Option<u64> {
        let backoff = Backoff::new();
        loop {
            match self.poll() {
                Poll::Ready(value) => return Some(value),
                Poll::Overrun { .. } => return None,
                Poll::Empty | Poll::Contended => {}
            }
            if backoff.is_completed() {
                return None;
            }
            backoff.snooze();
        }
    }

    /// Skips every unread value and rejoins at the producer's position.
    ///
    /// This is the recovery path after [`Poll::Overrun`]. Returns the number
    /// of values skipped.
    pub fn catch_up(&mut self) -> u64 {
        self.ring.catch_up(&mut self.cursor, self.id)
    }

    /// Values published but not yet read by this consumer.
    ///
    /// A lag of `capacity` or more means the consumer has been overrun.
    pub fn lag(&self) -> u64 {
        self.ring
            .write_position()
            .saturating_sub(self.cursor.position(self.ring.config()))
    }

    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[inline]
    pub fn id(&self) -> ConsumerId {
        self.id
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.config().capacity()
    }
}

impl Clone for Consumer {
    fn clone(&self) -> Self {
        Self::at(Arc::clone(&self.ring), self.cursor)
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::{Counters, CountersSnapshot};

    fn config(capacity: usize) -> Config {
        Config::new(capacity).unwrap()
    }

    #[test]
    fn test_every_consumer_sees_every_value() {
        let (mut producer, mut a) = channel(config(8));
        let mut b = producer.subscribe();

        for value in 1..=5 {
            producer.publish(value);
        }

        let from_a: Vec<u64> = std::iter::from_fn(|| a.try_pop()).collect();
        let from_b: Vec<u64> = std::iter::from_fn(|| b.try_pop()).collect();
        assert_eq!(from_a, vec![1, 2, 3, 4, 5]);
        assert_eq!(from_a, from_b);
    }

    #[test]
    fn test_consumers_progress_independently() {
        let (mut producer, mut fast) = channel(config(4));
        let mut slow = producer.subscribe();

        producer.publish(1);
        producer.publish(2);
        assert_eq!(fast.try_pop(), Some(1));
        assert_eq!(fast.try_pop(), Some(2));
        assert_eq!(fast.try_pop(), None);

        assert_eq!(slow.lag(), 2);
        assert_eq!(slow.try_pop(), Some(1));
        assert_eq!(slow.lag(), 1);
    }

    #[test]
    fn test_clone_forks_at_same_position() {
        let (mut producer, mut original) = channel(config(4));
        producer.publish(10);
        producer.publish(20);
        assert_eq!(original.try_pop(), Some(10));

        let mut fork = original.clone();
        assert_ne!(fork.id(), original.id());
        assert_eq!(fork.cursor(), original.cursor());
        assert_eq!(fork.try_pop(), Some(20));
        assert_eq!(original.try_pop(), Some(20));
    }

    #[test]
    fn test_subscribe_latest_skips_history() {
        let (mut producer, _first) = channel(config(4));
        for value in 0..10 {
            producer.publish(value);
        }

        let mut late = producer.subscribe_latest();
        assert_eq!(late.poll(), Poll::Empty);
        producer.publish(10);
        assert_eq!(late.try_pop(), Some(10));

        let mut early = producer.subscribe();
        assert!(matches!(early.poll(), Poll::Overrun { .. }));
    }

    #[test]
    fn test_overrun_then_catch_up() {
        let counters = std::sync::Arc::new(Counters::new());
        let (mut producer, mut consumer) =
            channel_with_diagnostics(config(4), counters.clone());

        for value in 0..9 {
            producer.publish(value);
        }
        assert_eq!(consumer.poll(), Poll::Overrun { laps: 2 });
        assert_eq!(consumer.catch_up(), 9);
        assert_eq!(consumer.lag(), 0);

        producer.publish(100);
        assert_eq!(consumer.try_pop(), Some(100));

        assert_eq!(
            counters.snapshot(),
            CountersSnapshot {
                published: 10,
                consumed: 1,
                empty: 0,
                contended: 0,
                overruns: 1,
                skipped: 9,
            }
        );
    }

    #[test]
    fn test_poll_with_backoff_gives_up_on_empty_ring() {
        let (_producer, mut consumer) = channel(config(2));
        assert_eq!(consumer.poll_with_backoff(), None);
        assert_eq!(consumer.cursor(), Cursor::new());
    }

    #[test]
    fn test_poll_with_backoff_returns_ready_value() {
        let (mut producer, mut consumer) = channel(config(2));
        producer.publish(5);
        assert_eq!(consumer.poll_with_backoff(), Some(5));
    }
}
