//! Pluggable diagnostics for ring activity.
//!
//! The ring never logs on its own. A [`Diagnostics`] sink can be installed at
//! construction and receives an [`Event`] for every publish and every poll
//! outcome. With no sink installed the hot path pays a single `Option` check.
//!
//! Two sinks ship with the crate:
//!
//! - [`Counters`]: lock-free event counters with a [`CountersSnapshot`] view
//! - `TracingDiagnostics` (feature `tracing`): forwards events to `tracing`
//!
//! ```
//! use seqring::{spmc, Config, Counters};
//! use std::sync::Arc;
//!
//! let counters = Arc::new(Counters::new());
//! let (mut producer, mut consumer) =
//!     spmc::channel_with_diagnostics(Config::default(), counters.clone());
//!
//! producer.publish(7);
//! assert_eq!(consumer.try_pop(), Some(7));
//! assert_eq!(consumer.try_pop(), None);
//!
//! let snapshot = counters.snapshot();
//! assert_eq!(snapshot.published, 1);
//! assert_eq!(snapshot.consumed, 1);
//! assert_eq!(snapshot.empty, 1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one consumer handle within a ring.
///
/// Ids are assigned in creation order starting at 0 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsumerId(pub(crate) usize);

impl ConsumerId {
    /// Returns the numeric id.
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer-{}", self.0)
    }
}

/// A single observable ring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The producer finished writing `value` into slot `index`.
    Published {
        index: usize,
        version: u64,
        value: u64,
    },
    /// A consumer validated and returned `value` from slot `index`.
    Consumed {
        consumer: ConsumerId,
        index: usize,
        wrap_count: u64,
        value: u64,
    },
    /// The slot has not been written for the consumer's current lap yet.
    Empty { consumer: ConsumerId, index: usize },
    /// A write was in progress, or raced the read.
    Contended { consumer: ConsumerId, index: usize },
    /// The producer lapped the consumer; the slot holds a newer generation.
    Overrun {
        consumer: ConsumerId,
        index: usize,
        expected: u64,
        observed: u64,
    },
    /// A consumer skipped `skipped` values to rejoin the producer.
    CaughtUp { consumer: ConsumerId, skipped: u64 },
}

/// Receives ring events.
///
/// Implementations are called inline on the producer and consumer threads,
/// so they must be cheap and must never block.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: Event);
}

/// Lock-free event counters.
#[derive(Debug, Default)]
pub struct Counters {
    published: AtomicU64,
    consumed: AtomicU64,
    empty: AtomicU64,
    contended: AtomicU64,
    overruns: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub published: u64,
    pub consumed: u64,
    pub empty: u64,
    pub contended: u64,
    /// Stale reads: polls that found a slot already overwritten by a later lap.
    pub overruns: u64,
    /// Values skipped by `catch_up`.
    pub skipped: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relaxed loads; counters are not synchronized with each other.
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            published: self.published.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

impl Diagnostics for Counters {
    #[inline]
    fn record(&self, event: Event) {
        let (counter, n) = match event {
            Event::Published { .. } => (&self.published, 1),
            Event::Consumed { .. } => (&self.consumed, 1),
            Event::Empty { .. } => (&self.empty, 1),
            Event::Contended { .. } => (&self.contended, 1),
            Event::Overrun { .. } => (&self.overruns, 1),
            Event::CaughtUp { skipped, .. } => (&self.skipped, skipped),
        };
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

/// Forwards events to `tracing`.
///
/// Publishes and polls go out at `TRACE`. Overruns are logged at `WARN` and
/// catch-ups at `DEBUG`.
#[cfg(feature = "tracing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

#[cfg(feature = "tracing")]
impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: Event) {
        match event {
            Event::Published {
                index,
                version,
                value,
            } => tracing::trace!(index, version, value, "published"),
            Event::Consumed {
                consumer,
                index,
                wrap_count,
                value,
            } => tracing::trace!(%consumer, index, wrap_count, value, "consumed"),
            Event::Empty { consumer, index } => tracing::trace!(%consumer, index, "empty"),
            Event::Contended { consumer, index } => {
                tracing::trace!(%consumer, index, "contended");
            }
            Event::Overrun {
                consumer,
                index,
                expected,
                observed,
            } => tracing::warn!(
                %consumer,
                index,
                expected,
                observed,
                "consumer overrun by producer"
            ),
            Event::CaughtUp { consumer, skipped } => {
                tracing::debug!(%consumer, skipped, "consumer caught up");
            }
        }
    }
}
