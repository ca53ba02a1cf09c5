use crate::diagnostics::{ConsumerId, Diagnostics, Event};
use crate::invariants::{debug_assert_monotonic, debug_assert_stable_version};
use crate::sync::{fence, AtomicU64, AtomicUsize, Ordering};
use crate::{Config, Cursor};
use crossbeam_utils::CachePadded;
use std::sync::Arc;

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Every slot is a seqlock: a version word brackets the payload write. The
// payload is itself an atomic so that a racing read is a stale or torn value,
// never undefined behaviour; the version check discards it.
//
// **Producer (publish):**
// 1. Load `write_cursor` with Relaxed (only the producer writes it)
// 2. Load slot `version` with Relaxed (only the producer writes it) -> `seq`
// 3. Store `seq + 1` with Relaxed, then `fence(Release)`: the odd marker is
//    ordered before the payload store for any reader that sees the payload
// 4. Store `payload` with Relaxed
// 5. Store `seq + 2` with Release: publishes the payload
// 6. Store `write_cursor + 1` with Release
//
// **Consumer (poll):**
// 1. Load slot `version` with Acquire -> `seq0`
// 2. Load `payload` with Relaxed (speculative)
// 3. `fence(Acquire)`, then load `version` with Relaxed -> `seq1`
// 4. Accept iff `seq0 == seq1 == 2 * (wrap_count + 1)`
//
// If the payload load in (2) observed a store made after the producer's
// release fence, the acquire fence in (3) synchronizes with it and `seq1` is
// guaranteed to see at least the odd marker, so the read is rejected.
//
// ## Single-Writer Invariants
//
// - `write_cursor`, every `version` and every `payload` are written only by
//   the producer handle, which is not `Clone` and publishes through `&mut self`
// - consumer cursors live in the consumer handles and are never shared
//
// No ordering is established between distinct consumers, and none across
// slots beyond the ring's index order.
//
// =============================================================================

/// One ring slot: a version word and a 64-bit payload.
///
/// Version 0 means never written. Even means stable, odd means a write is in
/// progress.
struct Slot {
    version: AtomicU64,
    payload: AtomicU64,
}

impl Slot {
    fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            payload: AtomicU64::new(0),
        }
    }
}

/// Result of a single non-blocking poll.
///
/// Only [`Poll::Ready`] advances the consumer. Every other outcome leaves the
/// cursor where it was and is a normal polling result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Poll {
    /// A validated, untorn value for the consumer's current position.
    Ready(u64),
    /// The producer has not reached this slot on the consumer's lap.
    Empty,
    /// A write was in progress or raced the read. Retry.
    Contended,
    /// The producer lapped the consumer `laps` times and overwrote the
    /// expected value. Retrying will not help; see `catch_up`.
    Overrun { laps: u64 },
}

impl Poll {
    /// Returns the value if the poll succeeded.
    #[inline]
    pub fn ready(self) -> Option<u64> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns `true` if a retry can succeed without caller intervention.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Empty | Self::Contended)
    }
}

/// Shared ring storage and the seqlock protocol.
///
/// Owned behind an `Arc` by the producer and consumer handles of both
/// topologies; the handles enforce who may call what.
pub(crate) struct RingCore {
    // === PRODUCER HOT ===
    /// Absolute number of values published. Slot index is `position & mask`.
    write_cursor: CachePadded<AtomicU64>,

    // === COLD STATE ===
    next_consumer: AtomicUsize,
    config: Config,
    diagnostics: Option<Arc<dyn Diagnostics>>,

    // === DATA ===
    /// Fixed at construction, never resized.
    slots: Box<[Slot]>,
}

impl RingCore {
    pub(crate) fn new(config: Config, diagnostics: Option<Arc<dyn Diagnostics>>) -> Self {
        let slots = (0..config.capacity()).map(|_| Slot::new()).collect();

        Self {
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            next_consumer: AtomicUsize::new(0),
            config,
            diagnostics,
            slots,
        }
    }

    #[inline]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Number of values published so far.
    #[inline]
    pub(crate) fn write_position(&self) -> u64 {
        self.write_cursor.load(Ordering::Acquire)
    }

    pub(crate) fn register_consumer(&self) -> ConsumerId {
        ConsumerId(self.next_consumer.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    fn emit(&self, event: Event) {
        if let Some(diagnostics) = &self.diagnostics {
            diagnostics.record(event);
        }
    }

    // ---------------------------------------------------------------------
    // PRODUCER
    // ---------------------------------------------------------------------

    /// Writes `value` into the next slot. Must only be reached from the
    /// single producer handle.
    ///
    /// Never checks whether the slot still holds a value some consumer has
    /// not read; that is the caller's sizing contract.
    #[inline]
    pub(crate) fn publish(&self, value: u64) {
        let position = self.write_cursor.load(Ordering::Relaxed);
        let index = self.config.index_of(position);
        let slot = &self.slots[index];

        let seq = slot.version.load(Ordering::Relaxed);
        slot.version.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        slot.payload.store(value, Ordering::Relaxed);

        let version = seq.wrapping_add(2);
        debug_assert_stable_version!(version);
        slot.version.store(version, Ordering::Release);

        let next = position.wrapping_add(1);
        debug_assert_monotonic!("write cursor", position, next);
        self.write_cursor.store(next, Ordering::Release);

        self.emit(Event::Published {
            index,
            version,
            value,
        });
    }

    // ---------------------------------------------------------------------
    // CONSUMER
    // ---------------------------------------------------------------------

    /// Reads the slot under `cursor` without touching it.
    #[inline]
    fn read(&self, cursor: &Cursor) -> (Poll, u64) {
        let slot = &self.slots[cursor.read_index()];
        let expected = cursor.expected_version();

        let seq0 = slot.version.load(Ordering::Acquire);
        let value = slot.payload.load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        let seq1 = slot.version.load(Ordering::Relaxed);

        let poll = if seq0 != seq1 || seq0 & 1 == 1 {
            Poll::Contended
        } else if seq0 == expected {
            Poll::Ready(value)
        } else if seq0 < expected {
            Poll::Empty
        } else {
            Poll::Overrun {
                laps: (seq0 - expected) / 2,
            }
        };
        (poll, seq0)
    }

    /// Polls the slot under `cursor`, advancing it on success.
    ///
    /// Wait-free: exactly three loads and a fence, no retry loop.
    #[inline]
    pub(crate) fn poll(&self, cursor: &mut Cursor, consumer: ConsumerId) -> Poll {
        let index = cursor.read_index();
        let (poll, observed) = self.read(cursor);

        match poll {
            Poll::Ready(value) => {
                let wrap_count = cursor.wrap_count();
                cursor.advance(&self.config);
                self.emit(Event::Consumed {
                    consumer,
                    index,
                    wrap_count,
                    value,
                });
            }
            Poll::Empty => self.emit(Event::Empty { consumer, index }),
            Poll::Contended => self.emit(Event::Contended { consumer, index }),
            Poll::Overrun { .. } => self.emit(Event::Overrun {
                consumer,
                index,
                expected: cursor.expected_version(),
                observed,
            }),
        }

        poll
    }

    /// Moves `cursor` to the producer's current position, returning how many
    /// values were skipped.
    pub(crate) fn catch_up(&self, cursor: &mut Cursor, consumer: ConsumerId) -> u64 {
        let latest = self.write_position();
        let current = cursor.position(&self.config);
        let skipped = latest.saturating_sub(current);

        if skipped > 0 {
            *cursor = Cursor::at_position(latest, &self.config);
            self.emit(Event::CaughtUp { consumer, skipped });
        }
        skipped
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    fn core(capacity: usize) -> RingCore {
        RingCore::new(Config::new(capacity).unwrap(), None)
    }

    #[test]
    fn test_publish_leaves_even_versions() {
        let ring = core(4);
        for value in 1..=6 {
            ring.publish(value);
        }

        let versions: Vec<u64> = ring
            .slots
            .iter()
            .map(|slot| slot.version.load(Ordering::Relaxed))
            .collect();
        // Slots 0 and 1 were written twice, 2 and 3 once.
        assert_eq!(versions, vec![4, 4, 2, 2]);
        assert_eq!(ring.write_position(), 6);
    }

    #[test]
    fn test_poll_classifies_slot_state() {
        let ring = core(2);
        let id = ring.register_consumer();
        let mut cursor = Cursor::new();

        assert_eq!(ring.poll(&mut cursor, id), Poll::Empty);

        ring.publish(10);
        assert_eq!(ring.poll(&mut cursor, id), Poll::Ready(10));
        assert_eq!(cursor.read_index(), 1);

        // Simulate a write caught mid-flight.
        ring.slots[1].version.store(1, Ordering::Relaxed);
        assert_eq!(ring.poll(&mut cursor, id), Poll::Contended);
        assert_eq!(cursor.read_index(), 1);
    }

    #[test]
    fn test_poll_detects_lapped_consumer() {
        let ring = core(2);
        let id = ring.register_consumer();
        let mut cursor = Cursor::new();

        // Three laps over slot 0 while the consumer is still on lap 0.
        for value in 0..6 {
            ring.publish(value);
        }
        assert_eq!(ring.poll(&mut cursor, id), Poll::Overrun { laps: 2 });
        assert_eq!(cursor, Cursor::new());

        assert_eq!(ring.catch_up(&mut cursor, id), 6);
        assert_eq!(ring.poll(&mut cursor, id), Poll::Empty);

        ring.publish(99);
        assert_eq!(ring.poll(&mut cursor, id), Poll::Ready(99));
    }

    #[test]
    fn test_consumer_ids_are_sequential() {
        let ring = core(2);
        assert_eq!(ring.register_consumer().get(), 0);
        assert_eq!(ring.register_consumer().get(), 1);
    }
}
