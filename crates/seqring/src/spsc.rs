//! Single-producer, single-consumer ring.
//!
//! Same slot protocol as [`spmc`](crate::spmc), but with exactly one consumer.
//! Because there is only one reader, its progress is mirrored into the ring
//! next to the write cursor (on its own cache line), which lets either side
//! ask how many values are in flight.
//!
//! ```
//! use seqring::{spsc, Config};
//!
//! let (mut producer, mut consumer) = spsc::channel(Config::new(4)?);
//!
//! producer.publish(42);
//! assert_eq!(producer.len(), 1);
//!
//! assert_eq!(consumer.try_pop(), Some(42));
//! assert!(consumer.is_empty());
//! # Ok::<(), seqring::ConfigError>(())
//! ```

use crate::diagnostics::{ConsumerId, Diagnostics};
use crate::invariants::debug_assert_monotonic;
use crate::ring::{Poll, RingCore};
use crate::sync::{Arc, AtomicU64, Ordering};
use crate::{Config, Cursor};
use crossbeam_utils::{Backoff, CachePadded};

struct Shared {
    ring: RingCore,
    /// Consumer's position, written only by the one consumer.
    consumed: CachePadded<AtomicU64>,
}

impl Shared {
    fn len(&self) -> usize {
        let published = self.ring.write_position();
        let consumed = self.consumed.load(Ordering::Acquire);
        published.saturating_sub(consumed) as usize
    }
}

/// Creates a ring with its only producer and only consumer.
pub fn channel(config: Config) -> (Producer, Consumer) {
    build(RingCore::new(config, None))
}

/// Creates a ring that reports every event to `diagnostics`.
pub fn channel_with_diagnostics(
    config: Config,
    diagnostics: std::sync::Arc<dyn Diagnostics>,
) -> (Producer, Consumer) {
    build(RingCore::new(config, Some(diagnostics)))
}

fn build(ring: RingCore) -> (Producer, Consumer) {
    let id = ring.register_consumer();
    let shared = Arc::new(Shared {
        ring,
        consumed: CachePadded::new(AtomicU64::new(0)),
    });
    let consumer = Consumer {
        shared: Arc::clone(&shared),
        cursor: Cursor::new(),
        id,
    };
    (Producer { shared }, consumer)
}

/// The writer half.
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Publishes `value` into the next slot.
    ///
    /// Like the broadcast ring this never blocks and never checks for unread
    /// slots. [`is_full`](Producer::is_full) is available for callers that
    /// want to pace themselves.
    #[inline]
    pub fn publish(&mut self, value: u64) {
        self.shared.ring.publish(value);
    }

    /// Values published but not yet consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the next publish would overwrite an unread value.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.shared.ring.write_position()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.ring.config().capacity()
    }
}

/// The reader half. Not `Clone`: there is exactly one.
pub struct Consumer {
    shared: Arc<Shared>,
    cursor: Cursor,
    id: ConsumerId,
}

impl Consumer {
    /// Returns the next value if it has been fully published.
    #[inline]
    pub fn try_pop(&mut self) -> Option<u64> {
        self.poll().ready()
    }

    /// Polls the next slot once, advancing only on [`Poll::Ready`].
    pub fn poll(&mut self) -> Poll {
        let poll = self.shared.ring.poll(&mut self.cursor, self.id);
        if poll.is_ready() {
            self.publish_progress();
        }
        poll
    }

    /// Polls with adaptive backoff until a value arrives or the backoff is
    /// exhausted. Returns `None` immediately on overrun.
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

    /// Skips every unread value. Returns the number skipped.
    pub fn catch_up(&mut self) -> u64 {
        let skipped = self.shared.ring.catch_up(&mut self.cursor, self.id);
        if skipped > 0 {
            self.publish_progress();
        }
        skipped
    }

    fn publish_progress(&self) {
        let position = self.cursor.position(self.shared.ring.config());
        debug_assert_monotonic!(
            "consumed position",
            self.shared.consumed.load(Ordering::Relaxed),
            position
        );
        self.shared.consumed.store(position, Ordering::Release);
    }

    /// Values published but not yet consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
        self.shared.ring.config().capacity()
    }
}
